// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::auth::ErrorResponse;

/// Number of characters of a non-JSON body quoted back to the user.
pub const NON_JSON_SNIPPET_LEN: usize = 100;

#[derive(Error, Debug)]
pub enum AppError {
    /// No active session on the incoming request.
    #[error("Authentication required")]
    AuthRequired,
    /// A collaborator answered with something other than JSON (usually an HTML error page).
    #[error("Server returned non-JSON response: {0}...")]
    UpstreamNonJson(String),
    /// JSON answer with `success: false` or a non-2xx status.
    #[error("{0}")]
    UpstreamFailure(String),
    /// The mess page could not be turned into a menu.
    #[error("Menu extraction failed: {0}")]
    Extraction(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    BadRequest(String),
    /// The requested selection does not fit the current session state.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
}

impl AppError {
    pub fn non_json(body: &str) -> Self {
        AppError::UpstreamNonJson(body.chars().take(NON_JSON_SNIPPET_LEN).collect())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::UpstreamNonJson(_)
            | AppError::UpstreamFailure(_)
            | AppError::Extraction(_)
            | AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = %status.as_u16(), error = %self, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
