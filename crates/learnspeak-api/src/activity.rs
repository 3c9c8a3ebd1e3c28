//! Handlers that record learning activity for one topic.

use axum::{Json, extract::Path};
use learnspeak_core::{
  progress::ProgressEvent,
  quiz::{QuizAnswer, QuizResult, QuizSubmission},
  store::ProgressStore as _,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LearnStore, SharedState, error::ApiError};

// ─── Flashcards ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FlashcardsBody {
  pub journey_id:         Option<Uuid>,
  #[serde(default)]
  pub time_spent_seconds: u32,
}

/// `POST /users/{user_id}/topics/{topic_id}/flashcards/complete`
pub async fn complete_flashcards<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, topic_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<FlashcardsBody>,
) -> Result<Json<ProgressEvent>, ApiError> {
  let event = state
    .activity
    .complete_flashcards(user_id, topic_id, body.journey_id, body.time_spent_seconds)
    .await?;
  Ok(Json(event))
}

// ─── Quiz ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QuizBody {
  pub journey_id:         Option<Uuid>,
  #[serde(default)]
  pub time_spent_seconds: u32,
  pub answers:            Vec<QuizAnswer>,
}

/// `POST /users/{user_id}/topics/{topic_id}/quiz/submit`
pub async fn submit_quiz<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, topic_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<QuizBody>,
) -> Result<Json<QuizResult>, ApiError> {
  let result = state
    .activity
    .submit_quiz(QuizSubmission {
      user_id,
      topic_id,
      journey_id: body.journey_id,
      time_spent_seconds: body.time_spent_seconds,
      answers: body.answers,
    })
    .await?;
  Ok(Json(result))
}

// ─── Topic progress ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TopicProgress {
  pub topic_id:   Uuid,
  pub completed:  bool,
  pub quiz_count: u32,
  pub events:     Vec<ProgressEvent>,
}

/// `GET /users/{user_id}/topics/{topic_id}/progress`
pub async fn topic_progress<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, topic_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TopicProgress>, ApiError> {
  let (completed, quiz_count) =
    state.aggregator.topic_status(user_id, topic_id).await?;
  let events = state
    .store
    .topic_progress(user_id, topic_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(TopicProgress { topic_id, completed, quiz_count, events }))
}
