pub mod catalog;
pub mod config;
pub mod directive;
pub mod github;
pub mod parse;
pub mod pipeline;
pub mod project;
pub mod provider;
pub mod rest;
pub mod retry;

use std::sync::Arc;

use config::DaemonConfig;
use provider::Synthesizer;

/// Shared application state passed to every route handler.
///
/// Everything in here is immutable after startup — request handlers never
/// share mutable state, so concurrent generations only meet on the
/// filesystem, where each gets its own project directory.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    /// The external text-generation provider, behind a trait object so
    /// tests can substitute a canned implementation.
    pub synthesizer: Arc<dyn Synthesizer>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<DaemonConfig>, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            config,
            synthesizer,
            started_at: std::time::Instant::now(),
        }
    }
}
