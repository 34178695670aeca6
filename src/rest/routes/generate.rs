// rest/routes/generate.rs — Generation routes.
//
// Each request runs one independent pipeline pass; no cross-request state
// is held while the provider call is outstanding. When a client disconnects
// mid-request axum drops the handler future, which aborts the provider call
// and lets the project-directory guard sweep up any partial output.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::directive::{GenerationMode, GenerationRequest};
use crate::pipeline::{self, GenerateError, GenerationResult};
use crate::AppContext;

type GenerateResponse = Result<Json<GenerationResult>, (StatusCode, Json<Value>)>;

pub async fn custom(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<GenerationRequest>,
) -> GenerateResponse {
    run(ctx, GenerationMode::Custom, Some(body)).await
}

pub async fn simple(State(ctx): State<Arc<AppContext>>) -> GenerateResponse {
    run(ctx, GenerationMode::Simple, None).await
}

pub async fn advanced(State(ctx): State<Arc<AppContext>>) -> GenerateResponse {
    run(ctx, GenerationMode::Advanced, None).await
}

async fn run(
    ctx: Arc<AppContext>,
    mode: GenerationMode,
    body: Option<GenerationRequest>,
) -> GenerateResponse {
    match pipeline::generate(&ctx, mode, body).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err(error_response(mode, e)),
    }
}

fn error_response(mode: GenerationMode, e: GenerateError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        GenerateError::Validation(_) => StatusCode::BAD_REQUEST,
        // Retryable by the caller; everything local that follows is not.
        GenerateError::Provider(_) => StatusCode::BAD_GATEWAY,
        GenerateError::Parse(_) | GenerateError::Filesystem(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    warn!(mode = mode.as_str(), kind = e.kind(), err = %e, "generation failed");
    (
        status,
        Json(json!({ "error": e.to_string(), "kind": e.kind() })),
    )
}
