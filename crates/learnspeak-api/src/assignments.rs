//! Handlers for assigning learners to a journey.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/journeys/{journey_id}/assignments` | `?status&page&page_size`, newest first |
//! | `POST` | `/journeys/{journey_id}/assign` | Body: `{"user_ids":[...],"assigned_by":"..."}`; 201 |
//! | `POST` | `/journeys/{journey_id}/unassign` | Body: `{"user_ids":[...]}` |

use axum::{
  Json,
  extract::{Path, Query},
  http::StatusCode,
  response::IntoResponse,
};
use learnspeak_core::assignment::{
  AssignmentQuery, AssignmentStatus, JourneyAssignment, Page, Paged,
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

/// `GET /journeys/{journey_id}/assignments`
pub async fn list<S: LearnStore>(
  state: SharedState<S>,
  Path(journey_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Paged<JourneyAssignment>>, ApiError> {
  let page = state
    .enrollment
    .list_assignments(AssignmentQuery {
      user_id:    None,
      journey_id: Some(journey_id),
      status:     params.status,
      page:       Page::new(params.page, params.page_size),
    })
    .await?;
  Ok(Json(page))
}

// ─── Assign ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub user_ids:    Vec<Uuid>,
  pub assigned_by: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AssignResponse {
  pub assigned: Vec<JourneyAssignment>,
  /// Users who already had the journey.
  pub skipped:  usize,
}

/// `POST /journeys/{journey_id}/assign`
pub async fn assign<S: LearnStore>(
  state: SharedState<S>,
  Path(journey_id): Path<Uuid>,
  Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.user_ids.is_empty() {
    return Err(ApiError::BadRequest("user_ids must not be empty".into()));
  }
  let assigned = state
    .enrollment
    .assign(journey_id, &body.user_ids, body.assigned_by)
    .await?;
  let skipped = body.user_ids.len() - assigned.len();
  Ok((StatusCode::CREATED, Json(AssignResponse { assigned, skipped })))
}

// ─── Unassign ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnassignBody {
  pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UnassignResponse {
  pub removed: usize,
}

/// `POST /journeys/{journey_id}/unassign`
pub async fn unassign<S: LearnStore>(
  state: SharedState<S>,
  Path(journey_id): Path<Uuid>,
  Json(body): Json<UnassignBody>,
) -> Result<Json<UnassignResponse>, ApiError> {
  let removed = state.enrollment.unassign(journey_id, &body.user_ids).await?;
  Ok(Json(UnassignResponse { removed }))
}
