//! Error types for `learnspeak-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("journey not found: {0}")]
  JourneyNotFound(Uuid),

  #[error("topic not found: {0}")]
  TopicNotFound(Uuid),

  #[error("user {user_id} is not assigned to journey {journey_id}")]
  AssignmentNotFound { user_id: Uuid, journey_id: Uuid },

  #[error("invitation not found")]
  InvitationNotFound,

  #[error("user {user_id} is already assigned to journey {journey_id}")]
  AlreadyAssigned { user_id: Uuid, journey_id: Uuid },

  #[error("invitation is no longer valid: {0}")]
  InvitationInvalid(String),

  #[error("no quiz questions found for topic {0}")]
  NoQuizQuestions(Uuid),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
