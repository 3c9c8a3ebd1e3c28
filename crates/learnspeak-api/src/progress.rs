//! Handlers for a learner's journeys.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{user_id}/journeys` | `?status&page&page_size`; each with its progress snapshot |
//! | `GET`  | `/users/{user_id}/journeys/{journey_id}/progress` | [`ProgressSnapshot`] |
//! | `GET`  | `/users/{user_id}/journeys/{journey_id}/completed-topics` | topic ids |
//! | `GET`  | `/users/{user_id}/journeys/{journey_id}/next-topic` | `null` once finished |
//! | `POST` | `/users/{user_id}/journeys/{journey_id}/start` | idempotent |
//! | `POST` | `/users/{user_id}/journeys/{journey_id}/complete` | |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, Query},
};
use learnspeak_core::{
  assignment::{AssignmentQuery, AssignmentStatus, JourneyAssignment, Page, Paged},
  content::TopicSummary,
  progress::ProgressSnapshot,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LearnStore, SharedState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:    Option<AssignmentStatus>,
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct JourneyWithProgress {
  #[serde(flatten)]
  pub assignment: JourneyAssignment,
  pub progress:   ProgressSnapshot,
}

/// `GET /users/{user_id}/journeys`
pub async fn list_journeys<S: LearnStore>(
  state: SharedState<S>,
  Path(user_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Paged<JourneyWithProgress>>, ApiError> {
  let page = state
    .enrollment
    .list_assignments(AssignmentQuery {
      user_id: Some(user_id),
      journey_id: None,
      status: params.status,
      page: Page::new(params.page, params.page_size),
    })
    .await?;

  let mut items = Vec::with_capacity(page.items.len());
  for assignment in page.items {
    let progress = state.aggregator.snapshot(user_id, assignment.journey_id).await?;
    items.push(JourneyWithProgress { assignment, progress });
  }

  Ok(Json(Paged {
    items,
    total: page.total,
    page: page.page,
    page_size: page.page_size,
    total_pages: page.total_pages,
  }))
}

// ─── Derived progress ────────────────────────────────────────────────────────

/// `GET /users/{user_id}/journeys/{journey_id}/progress`
pub async fn snapshot<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, journey_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
  Ok(Json(state.aggregator.snapshot(user_id, journey_id).await?))
}

/// `GET /users/{user_id}/journeys/{journey_id}/completed-topics`
pub async fn completed_topics<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, journey_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BTreeSet<Uuid>>, ApiError> {
  Ok(Json(state.aggregator.completed_topic_ids(user_id, journey_id).await?))
}

/// `GET /users/{user_id}/journeys/{journey_id}/next-topic`
pub async fn next_topic<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, journey_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Option<TopicSummary>>, ApiError> {
  Ok(Json(state.aggregator.next_topic(user_id, journey_id).await?))
}

// ─── Status transitions ──────────────────────────────────────────────────────

/// `POST /users/{user_id}/journeys/{journey_id}/start`
pub async fn start<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, journey_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JourneyAssignment>, ApiError> {
  Ok(Json(state.status.mark_started(user_id, journey_id).await?))
}

/// `POST /users/{user_id}/journeys/{journey_id}/complete`
pub async fn complete<S: LearnStore>(
  state: SharedState<S>,
  Path((user_id, journey_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JourneyAssignment>, ApiError> {
  Ok(Json(state.status.mark_completed(user_id, journey_id).await?))
}
