//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The referenced resource existed but can no longer be used.
  #[error("gone: {0}")]
  Gone(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Convert a backend error returned by a direct store call.
  pub fn store<E: Into<learnspeak_core::Error>>(e: E) -> Self {
    let core: learnspeak_core::Error = e.into();
    core.into()
  }
}

impl From<learnspeak_core::Error> for ApiError {
  fn from(e: learnspeak_core::Error) -> Self {
    use learnspeak_core::Error as E;
    match e {
      E::JourneyNotFound(_)
      | E::TopicNotFound(_)
      | E::AssignmentNotFound { .. }
      | E::InvitationNotFound => ApiError::NotFound(e.to_string()),
      E::AlreadyAssigned { .. } => ApiError::Conflict(e.to_string()),
      E::InvitationInvalid(reason) => ApiError::Gone(reason),
      E::NoQuizQuestions(_) => ApiError::BadRequest(e.to_string()),
      E::Storage(inner) => ApiError::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Gone(m) => (StatusCode::GONE, m.clone()),
      ApiError::Store(e) => {
        error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
