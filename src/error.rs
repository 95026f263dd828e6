use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::response::ErrorResponse;

/// Request-level failures that end a dispatch before or instead of the
/// per-user fan-out.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("user_id or user_ids required")]
    MissingTargets,

    #[error("title and body are required")]
    MissingContent,

    #[error("Template {0} not found")]
    TemplateNotFound(String),

    #[error("Template {name} produced invalid data: {source}")]
    TemplateData {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidBody(_)
            | DispatchError::MissingTargets
            | DispatchError::MissingContent => StatusCode::BAD_REQUEST,
            DispatchError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::TemplateData { .. } | DispatchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Dispatch failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
