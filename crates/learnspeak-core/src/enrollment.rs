//! Putting learners on journeys: direct assignment by an instructor, and
//! self-enrolment through invitation links.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::{AssignmentQuery, JourneyAssignment, NewAssignment, Paged},
  content::Journey,
  invitation::{InvitationDetails, JourneyInvitation, NewInvitation},
  store::{AssignmentStore, ContentRepository},
  time::Clock,
};

pub struct Enrollment<C, A> {
  content:     Arc<C>,
  assignments: Arc<A>,
  clock:       Clock,
}

impl<C: ContentRepository, A: AssignmentStore> Enrollment<C, A> {
  pub fn new(content: Arc<C>, assignments: Arc<A>, clock: Clock) -> Self {
    Self { content, assignments, clock }
  }

  // ── Assignments ───────────────────────────────────────────────────────

  /// Assign each user to the journey. Users who already have it are
  /// skipped; only the newly created assignments are returned.
  pub async fn assign(
    &self,
    journey_id: Uuid,
    user_ids: &[Uuid],
    assigned_by: Uuid,
  ) -> Result<Vec<JourneyAssignment>> {
    self.require_journey(journey_id).await?;

    let now = self.clock.now();
    let mut created = Vec::with_capacity(user_ids.len());
    for &user_id in user_ids {
      let result: Result<JourneyAssignment> = self
        .assignments
        .insert_assignment(NewAssignment {
          user_id,
          journey_id,
          assigned_by,
          assigned_at: now,
        })
        .await
        .map_err(Into::into);
      match result {
        Ok(assignment) => created.push(assignment),
        Err(Error::AlreadyAssigned { .. }) => {
          debug!(%user_id, %journey_id, "already assigned, skipping");
        }
        Err(e) => return Err(e),
      }
    }

    info!(
      %journey_id,
      %assigned_by,
      requested = user_ids.len(),
      assigned = created.len(),
      "users assigned"
    );
    Ok(created)
  }

  /// Remove the journey from each user. Returns how many assignments were
  /// deleted.
  pub async fn unassign(&self, journey_id: Uuid, user_ids: &[Uuid]) -> Result<usize> {
    let mut removed = 0;
    for &user_id in user_ids {
      if self
        .assignments
        .delete_assignment(user_id, journey_id)
        .await
        .map_err(Into::into)?
      {
        removed += 1;
      }
    }
    info!(%journey_id, removed, "users unassigned");
    Ok(removed)
  }

  pub async fn list_assignments(
    &self,
    query: AssignmentQuery,
  ) -> Result<Paged<JourneyAssignment>> {
    let page = query.page;
    let (items, total) = self
      .assignments
      .list_assignments(query)
      .await
      .map_err(Into::into)?;
    Ok(Paged::new(items, total, page))
  }

  // ── Invitations ───────────────────────────────────────────────────────

  pub async fn create_invitation(
    &self,
    journey_id: Uuid,
    created_by: Uuid,
    expires_in_days: Option<u32>,
    max_uses: Option<u32>,
  ) -> Result<JourneyInvitation> {
    self.require_journey(journey_id).await?;

    let now = self.clock.now();
    let invitation = self
      .assignments
      .create_invitation(NewInvitation {
        journey_id,
        created_by,
        expires_at: expires_in_days.map(|d| now + Duration::days(i64::from(d))),
        max_uses,
        created_at: now,
      })
      .await
      .map_err(Into::into)?;

    info!(
      %journey_id,
      invitation_id = %invitation.invitation_id,
      "invitation created"
    );
    Ok(invitation)
  }

  /// What the holder of `token` would be joining. Unknown tokens are
  /// reported as invalid rather than as an error.
  pub async fn invitation_details(&self, token: &str) -> Result<InvitationDetails> {
    let Some(invitation) = self
      .assignments
      .get_invitation_by_token(token.to_string())
      .await
      .map_err(Into::into)?
    else {
      return Ok(InvitationDetails {
        journey:     None,
        topic_count: 0,
        expires_at:  None,
        is_valid:    false,
        message:     Some("Invitation not found".into()),
      });
    };

    let journey = self.require_journey(invitation.journey_id).await?;
    let topic_count = self
      .content
      .journey_topics(invitation.journey_id)
      .await
      .map_err(Into::into)?
      .len();

    let validity = invitation.validity(self.clock.now());
    Ok(InvitationDetails {
      journey: Some(journey),
      topic_count,
      expires_at: invitation.expires_at,
      is_valid: validity.is_valid(),
      message: (!validity.is_valid()).then(|| validity.message().to_string()),
    })
  }

  /// Enrol `user_id` through an invitation link.
  ///
  /// The new assignment is attributed to the invitation's creator. Claiming
  /// a use and creating the assignment happen in one store step, so
  /// concurrent accepts can never push `current_uses` past `max_uses`.
  pub async fn accept_invitation(
    &self,
    token: &str,
    user_id: Uuid,
  ) -> Result<JourneyAssignment> {
    let invitation = self
      .assignments
      .get_invitation_by_token(token.to_string())
      .await
      .map_err(Into::into)?
      .ok_or(Error::InvitationNotFound)?;

    let now = self.clock.now();
    let validity = invitation.validity(now);
    if !validity.is_valid() {
      return Err(Error::InvitationInvalid(validity.message().to_string()));
    }

    let journey_id = invitation.journey_id;
    let assignment = self
      .assignments
      .redeem_invitation(invitation.invitation_id, NewAssignment {
        user_id,
        journey_id,
        assigned_by: invitation.created_by,
        assigned_at: now,
      })
      .await
      .map_err(Into::into)?;

    info!(%user_id, %journey_id, "invitation accepted");
    Ok(assignment)
  }

  pub async fn list_invitations(
    &self,
    journey_id: Uuid,
  ) -> Result<Vec<JourneyInvitation>> {
    self.require_journey(journey_id).await?;
    self
      .assignments
      .list_invitations(journey_id)
      .await
      .map_err(Into::into)
  }

  /// Deactivate an invitation. It must belong to `journey_id`.
  pub async fn deactivate_invitation(
    &self,
    journey_id: Uuid,
    invitation_id: Uuid,
  ) -> Result<()> {
    let invitation = self
      .assignments
      .get_invitation(invitation_id)
      .await
      .map_err(Into::into)?
      .filter(|i| i.journey_id == journey_id)
      .ok_or(Error::InvitationNotFound)?;

    self
      .assignments
      .deactivate_invitation(invitation.invitation_id)
      .await
      .map_err(Into::into)?;
    info!(%journey_id, %invitation_id, "invitation deactivated");
    Ok(())
  }

  async fn require_journey(&self, journey_id: Uuid) -> Result<Journey> {
    self
      .content
      .get_journey(journey_id)
      .await
      .map_err(Into::into)?
      .ok_or(Error::JourneyNotFound(journey_id))
  }
}
