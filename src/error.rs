/*
 * Responsibility
 * - Transport-level AppError and its IntoResponse
 * - The shared error envelope: {"errors": [{"message": ...}]}
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    pub fn at(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Some(vec![field.into()]),
        }
    }
}

impl ErrorResponse {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorEntry::new(message)],
        }
    }
}

/// Render `message` in the error envelope with the given status.
pub fn envelope(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::single(message))).into_response()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    // details are logged by the caller, never sent
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        envelope(status, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_carries_its_message() {
        let (status, body) = render(AppError::bad_request("invalid request body")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "errors": [{ "message": "invalid request body" }] }));
    }

    #[tokio::test]
    async fn internal_is_500_with_a_fixed_message() {
        let (status, body) = render(AppError::Internal).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "errors": [{ "message": "internal server error" }] }));
    }
}
