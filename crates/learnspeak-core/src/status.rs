//! The `assigned → in_progress → completed` lifecycle of a journey
//! assignment.
//!
//! Each transition is a single conditional write in the store, so a start
//! racing a completion can never pull a completed assignment back to
//! `in_progress`. Nothing here looks at topic progress; completing every
//! topic does not complete the assignment.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  assignment::{JourneyAssignment, Transition},
  store::AssignmentStore,
  time::Clock,
};

pub struct JourneyStatusMachine<A> {
  assignments: Arc<A>,
  clock:       Clock,
}

impl<A: AssignmentStore> JourneyStatusMachine<A> {
  pub fn new(assignments: Arc<A>, clock: Clock) -> Self {
    Self { assignments, clock }
  }

  /// `assigned → in_progress`. Calling it again, or on a completed journey,
  /// returns the assignment unchanged.
  pub async fn mark_started(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<JourneyAssignment> {
    let Transition { assignment, changed } = self
      .assignments
      .start_assignment(user_id, journey_id, self.clock.now())
      .await
      .map_err(Into::into)?
      .ok_or(Error::AssignmentNotFound { user_id, journey_id })?;
    if changed {
      info!(%user_id, %journey_id, "journey started");
    }
    Ok(assignment)
  }

  /// Move to `completed` from any status. `started_at` is left as stored.
  pub async fn mark_completed(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> Result<JourneyAssignment> {
    let Transition { assignment, .. } = self
      .assignments
      .complete_assignment(user_id, journey_id, self.clock.now())
      .await
      .map_err(Into::into)?
      .ok_or(Error::AssignmentNotFound { user_id, journey_id })?;
    info!(%user_id, %journey_id, "journey completed");
    Ok(assignment)
  }

  /// Delete the assignment whatever its status. Returns whether one existed.
  pub async fn unassign(&self, user_id: Uuid, journey_id: Uuid) -> Result<bool> {
    let removed = self
      .assignments
      .delete_assignment(user_id, journey_id)
      .await
      .map_err(Into::into)?;
    if removed {
      info!(%user_id, %journey_id, "journey unassigned");
    }
    Ok(removed)
  }
}
