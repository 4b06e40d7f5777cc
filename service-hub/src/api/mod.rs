pub mod sessions;

use crate::error::HttpError;
use axum::Json;
use serde_json::json;

pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({"ping": "pong!"}))
}

pub async fn not_found() -> HttpError {
    HttpError::NotFound("resource not found".to_owned())
}
