//! Capability traits implemented by storage backends.
//!
//! The services in this crate depend on these abstractions, never on a
//! concrete backend (e.g. `learnspeak-store-sqlite`). Each capability shares
//! the backend's error type through [`Backend`], and that error converts into
//! [`crate::Error`] so services can surface it unchanged.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  assignment::{AssignmentQuery, JourneyAssignment, NewAssignment, Transition},
  content::{Journey, JourneyTopic, QuizQuestion, Topic},
  invitation::{JourneyInvitation, NewInvitation},
  progress::{ActivityType, NewProgressEvent, ProgressEvent},
};

/// The error type shared by every capability a backend implements.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// Read-only curriculum structure.
pub trait ContentRepository: Backend {
  /// Retrieve a journey by UUID. Returns `None` if not found.
  fn get_journey(
    &self,
    journey_id: Uuid,
  ) -> impl Future<Output = Result<Option<Journey>, Self::Error>> + Send + '_;

  /// The journey's topic links in ascending `sequence_order`, ties kept in
  /// insertion order.
  ///
  /// Returns [`crate::Error::JourneyNotFound`] (converted) if the journey
  /// does not exist.
  fn journey_topics(
    &self,
    journey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<JourneyTopic>, Self::Error>> + Send + '_;

  fn get_topic(
    &self,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<Option<Topic>, Self::Error>> + Send + '_;

  /// Number of quiz questions attached to a topic. Errors if the topic does
  /// not exist.
  fn quiz_count(
    &self,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  fn quiz_questions(
    &self,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<Vec<QuizQuestion>, Self::Error>> + Send + '_;
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// Per-user, per-topic activity events.
pub trait ProgressStore: Backend {
  /// All events of one activity type for a (user, topic) pair, whatever
  /// journey they were recorded under.
  fn find_progress_events(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
    activity_type: ActivityType,
  ) -> impl Future<Output = Result<Vec<ProgressEvent>, Self::Error>> + Send + '_;

  /// Append a new event. `event_id` and `recorded_at` are set by the store.
  fn create_progress_event(
    &self,
    input: NewProgressEvent,
  ) -> impl Future<Output = Result<ProgressEvent, Self::Error>> + Send + '_;

  /// Find-or-update the single flashcard event for `(user, topic)`.
  ///
  /// Creates the event when absent. Otherwise marks it completed and adds
  /// `input.time_spent_seconds` to the stored total; the original
  /// `journey_id` and `completed_at` are kept when already set.
  fn record_flashcard_completion(
    &self,
    input: NewProgressEvent,
  ) -> impl Future<Output = Result<ProgressEvent, Self::Error>> + Send + '_;

  /// Every event for a (user, topic) pair, oldest first.
  fn topic_progress(
    &self,
    user_id: Uuid,
    topic_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ProgressEvent>, Self::Error>> + Send + '_;
}

// ─── Assignments & invitations ───────────────────────────────────────────────

pub trait AssignmentStore: Backend {
  // ── Assignments ───────────────────────────────────────────────────────

  /// Persist a new assignment with status `assigned`.
  ///
  /// Returns [`crate::Error::AlreadyAssigned`] (converted) if the pair is
  /// already assigned.
  fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<JourneyAssignment, Self::Error>> + Send + '_;

  fn get_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> impl Future<Output = Result<Option<JourneyAssignment>, Self::Error>>
  + Send
  + '_;

  /// Atomically move the assignment `assigned → in_progress`, stamping
  /// `started_at = at`. Any other stored status is left as it is.
  ///
  /// `None` when the user is not assigned to the journey.
  fn start_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Transition>, Self::Error>> + Send + '_;

  /// Atomically move the assignment to `completed` from any status. Only
  /// `status` and `completed_at` are written.
  ///
  /// `None` when the user is not assigned to the journey.
  fn complete_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Transition>, Self::Error>> + Send + '_;

  /// Returns whether a row was removed.
  fn delete_assignment(
    &self,
    user_id: Uuid,
    journey_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// One page of matching assignments, newest first, and the total number of
  /// matches.
  fn list_assignments(
    &self,
    query: AssignmentQuery,
  ) -> impl Future<Output = Result<(Vec<JourneyAssignment>, u64), Self::Error>>
  + Send
  + '_;

  // ── Invitations ───────────────────────────────────────────────────────

  /// Persist a new active invitation with a freshly generated token.
  fn create_invitation(
    &self,
    input: NewInvitation,
  ) -> impl Future<Output = Result<JourneyInvitation, Self::Error>> + Send + '_;

  fn get_invitation(
    &self,
    invitation_id: Uuid,
  ) -> impl Future<Output = Result<Option<JourneyInvitation>, Self::Error>>
  + Send
  + '_;

  fn get_invitation_by_token(
    &self,
    token: String,
  ) -> impl Future<Output = Result<Option<JourneyInvitation>, Self::Error>>
  + Send
  + '_;

  /// All invitations for a journey, newest first.
  fn list_invitations(
    &self,
    journey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<JourneyInvitation>, Self::Error>>
  + Send
  + '_;

  /// Claim one use of the invitation and create the assignment, as a single
  /// atomic step.
  ///
  /// The use is only claimed while the invitation is active, unexpired at
  /// `input.assigned_at`, and below `max_uses`; otherwise nothing is written
  /// and [`crate::Error::InvitationInvalid`] is returned. An existing
  /// assignment for the pair rolls the claim back with
  /// [`crate::Error::AlreadyAssigned`]. Unknown ids give
  /// [`crate::Error::InvitationNotFound`]. All converted.
  fn redeem_invitation(
    &self,
    invitation_id: Uuid,
    input: NewAssignment,
  ) -> impl Future<Output = Result<JourneyAssignment, Self::Error>> + Send + '_;

  /// Returns [`crate::Error::InvitationNotFound`] (converted) if the id is
  /// unknown.
  fn deactivate_invitation(
    &self,
    invitation_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
