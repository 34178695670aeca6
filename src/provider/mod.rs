//! The external text-generation provider seam.
//!
//! The pipeline only ever sees [`Synthesizer`] — a single call that takes a
//! directive and returns the provider's raw payload. Production wires in
//! [`OpenAiSynthesizer`]; tests substitute canned implementations.

pub mod openai;

pub use openai::OpenAiSynthesizer;

use async_trait::async_trait;
use std::time::Duration;

/// The external call failed, was rejected, or timed out.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response contained no completion content")]
    EmptyResponse,
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// One synthesis call: directive in, raw structured payload out.
    ///
    /// Must be safe to re-invoke with the same directive — there is no
    /// provider-side state — which is what makes retrying it sound.
    async fn synthesize(&self, directive: &str) -> Result<String, ProviderError>;
}
