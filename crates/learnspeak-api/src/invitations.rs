//! Handlers for invitation links.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/journeys/{journey_id}/invitations` | newest first |
//! | `POST`   | `/journeys/{journey_id}/invitations` | Body: [`CreateBody`]; 201 |
//! | `DELETE` | `/journeys/{journey_id}/invitations/{invitation_id}` | 204 |
//! | `GET`    | `/invitations/{token}` | Always 200; `is_valid` says whether it can be used |
//! | `POST`   | `/invitations/{token}/accept` | Body: `{"user_id":"..."}`; 201, 410 if unusable |

use axum::{
  Json,
  extract::Path,
  http::StatusCode,
  response::IntoResponse,
};
use learnspeak_core::invitation::{InvitationDetails, JourneyInvitation};
use serde::Deserialize;
use uuid::Uuid;

use crate::{LearnStore, SharedState, error::ApiError};

/// `GET /journeys/{journey_id}/invitations`
pub async fn list<S: LearnStore>(
  state: SharedState<S>,
  Path(journey_id): Path<Uuid>,
) -> Result<Json<Vec<JourneyInvitation>>, ApiError> {
  Ok(Json(state.enrollment.list_invitations(journey_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub created_by:      Uuid,
  /// Omit for a link that never expires.
  pub expires_in_days: Option<u32>,
  /// Omit for unlimited uses.
  pub max_uses:        Option<u32>,
}

/// `POST /journeys/{journey_id}/invitations`
pub async fn create<S: LearnStore>(
  state: SharedState<S>,
  Path(journey_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.max_uses == Some(0) {
    return Err(ApiError::BadRequest("max_uses must be at least 1".into()));
  }
  let invitation = state
    .enrollment
    .create_invitation(journey_id, body.created_by, body.expires_in_days, body.max_uses)
    .await?;
  Ok((StatusCode::CREATED, Json(invitation)))
}

/// `DELETE /journeys/{journey_id}/invitations/{invitation_id}`
pub async fn deactivate<S: LearnStore>(
  state: SharedState<S>,
  Path((journey_id, invitation_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  state
    .enrollment
    .deactivate_invitation(journey_id, invitation_id)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /invitations/{token}`
pub async fn details<S: LearnStore>(
  state: SharedState<S>,
  Path(token): Path<String>,
) -> Result<Json<InvitationDetails>, ApiError> {
  Ok(Json(state.enrollment.invitation_details(&token).await?))
}

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
  pub user_id: Uuid,
}

/// `POST /invitations/{token}/accept`
pub async fn accept<S: LearnStore>(
  state: SharedState<S>,
  Path(token): Path<String>,
  Json(body): Json<AcceptBody>,
) -> Result<impl IntoResponse, ApiError> {
  let assignment = state
    .enrollment
    .accept_invitation(&token, body.user_id)
    .await?;
  Ok((StatusCode::CREATED, Json(assignment)))
}
