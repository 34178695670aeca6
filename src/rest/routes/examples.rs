use axum::Json;
use serde_json::{json, Value};

use crate::catalog;

pub async fn list_examples() -> Json<Value> {
    Json(json!({ "examples": catalog::all_examples() }))
}
