//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Bodies are short plain-text messages; there is no structured error schema.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("payload too large: {0}")]
  TooLarge(String),

  #[error("invalid credentials")]
  Unauthorized,

  /// The media relay failed; details are logged, not returned.
  #[error("upstream error: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m).into_response(),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m).into_response(),
      ApiError::TooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m).into_response(),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
      }
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "media relay upload failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading to Cloudinary").into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, m).into_response()
      }
    }
  }
}
