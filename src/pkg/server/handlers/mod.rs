pub mod jobs;
pub mod probes;
pub mod upload;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::pkg::internal::store::StoreError;

/// Envelope returned by every write route.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WriteResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl WriteResponse {
    pub fn accepted(message: &str, count: usize) -> Self {
        WriteResponse {
            success: true,
            message: message.into(),
            count: Some(count),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        WriteResponse {
            success: false,
            message: message.into(),
            count: None,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let message = match self {
            StoreError::MalformedInput(message) => message,
            StoreError::Io(err) => {
                tracing::error!("request failed on io: {}", err);
                "Failed to process uploaded file".to_string()
            }
        };
        (StatusCode::BAD_REQUEST, Json(WriteResponse::rejected(message))).into_response()
    }
}
