use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, e) = match self {
            Self::NotFound(e) => (StatusCode::NOT_FOUND, e),
        };

        let body = Json(json!({"error": e}));
        (status, body).into_response()
    }
}
