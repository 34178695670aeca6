// SPDX-License-Identifier: MIT
//! The request-to-project generation pipeline.
//!
//! One linear pass per request: validate → build directive → synthesize
//! (the single suspension point, bounded by the provider timeout) → parse →
//! materialize → result. There is no intermediate persisted state and no
//! cross-request lock; the only side effect is the project directory, which
//! is removed again if any later step fails or the request is canceled.

use serde::Serialize;
use tracing::info;

use crate::directive::{build_directive, GenerationMode, GenerationRequest};
use crate::parse::{parse_file_entries, ParseError};
use crate::project::{materialize, FilesystemError, ProjectDir};
use crate::provider::ProviderError;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::AppContext;

/// Successful outcome: where the project landed and what was written.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub message: String,
    pub project_path: String,
    pub files: Vec<String>,
}

/// Every way a generation can fail, as distinct caller-visible categories.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl GenerateError {
    /// Stable discriminator carried in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerateError::Validation(_) => "validation",
            GenerateError::Provider(_) => "provider",
            GenerateError::Parse(_) => "parse",
            GenerateError::Filesystem(_) => "filesystem",
        }
    }
}

/// Run one generation end to end.
///
/// `body` is only consulted in `Custom` mode; the fixed modes ignore it.
/// Validation happens before any filesystem or network activity, and the
/// project directory is only allocated once the provider's output has
/// parsed cleanly — a timed-out or malformed synthesis leaves no trace on
/// disk.
pub async fn generate(
    ctx: &AppContext,
    mode: GenerationMode,
    body: Option<GenerationRequest>,
) -> Result<GenerationResult, GenerateError> {
    let request = resolve_request(mode, body)?;
    let directive = build_directive(&request, mode);

    let retry_cfg = RetryConfig::attempts(ctx.config.provider.max_attempts);
    let synthesizer = &*ctx.synthesizer;
    let directive_text = directive.as_str();
    let payload =
        retry_with_backoff(&retry_cfg, || synthesizer.synthesize(directive_text)).await?;

    let files = parse_file_entries(&payload)?;

    let dir = ProjectDir::allocate(&ctx.config.projects_dir, mode.dir_prefix()).await?;
    let written = materialize(&dir, &files).await?;
    let project_path = dir.keep();

    info!(
        mode = mode.as_str(),
        files = written.len(),
        path = %project_path.display(),
        "project generated"
    );

    Ok(GenerationResult {
        message: mode.success_message().to_string(),
        project_path: project_path.display().to_string(),
        files: written,
    })
}

fn resolve_request(
    mode: GenerationMode,
    body: Option<GenerationRequest>,
) -> Result<GenerationRequest, GenerateError> {
    match mode.fixed_request() {
        Some(fixed) => Ok(fixed),
        None => {
            let request = body.ok_or_else(|| {
                GenerateError::Validation("request body is required".to_string())
            })?;
            if request.prompt.trim().is_empty() {
                return Err(GenerateError::Validation(
                    "prompt must not be empty".to_string(),
                ));
            }
            Ok(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_mode_requires_a_nonempty_prompt() {
        let err = resolve_request(
            GenerationMode::Custom,
            Some(GenerationRequest {
                prompt: "   ".to_string(),
                features: None,
                tech_stack: None,
            }),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let err = resolve_request(GenerationMode::Custom, None).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn fixed_modes_ignore_the_caller_body() {
        let body = GenerationRequest {
            prompt: "ignore me entirely".to_string(),
            features: Some("x".to_string()),
            tech_stack: Some("y".to_string()),
        };
        let resolved = resolve_request(GenerationMode::Simple, Some(body)).unwrap();
        assert!(resolved.prompt.contains("simple FastAPI app"));
    }
}
