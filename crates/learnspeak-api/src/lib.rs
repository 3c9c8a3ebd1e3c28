//! JSON REST API for LearnSpeak journey progress.
//!
//! Exposes an axum [`Router`] backed by any store implementing the three
//! capability traits of [`learnspeak_core::store`]. Authentication, TLS and
//! transport concerns are the caller's responsibility; user identity arrives
//! in request paths and bodies.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", learnspeak_api::api_router(store.clone()))
//! ```

pub mod activity;
pub mod assignments;
pub mod error;
pub mod invitations;
pub mod progress;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use learnspeak_core::{
  activity::ActivityRecorder,
  aggregator::ProgressAggregator,
  enrollment::Enrollment,
  status::JourneyStatusMachine,
  store::{AssignmentStore, ContentRepository, ProgressStore},
  time::Clock,
};

pub use error::ApiError;

/// Everything a backend must provide to serve the API.
pub trait LearnStore:
  ContentRepository + ProgressStore + AssignmentStore + 'static
{
}

impl<T> LearnStore for T where
  T: ContentRepository + ProgressStore + AssignmentStore + 'static
{
}

// ─── Application state ───────────────────────────────────────────────────────

/// Services shared by all handlers, each wired to the same store.
pub struct AppState<S> {
  pub aggregator: ProgressAggregator<S, S>,
  pub status:     JourneyStatusMachine<S>,
  pub activity:   ActivityRecorder<S, S>,
  pub enrollment: Enrollment<S, S>,
  pub store:      Arc<S>,
}

impl<S: LearnStore> AppState<S> {
  pub fn new(store: Arc<S>, clock: Clock) -> Self {
    Self {
      aggregator: ProgressAggregator::new(store.clone(), store.clone()),
      status:     JourneyStatusMachine::new(store.clone(), clock),
      activity:   ActivityRecorder::new(store.clone(), store.clone(), clock),
      enrollment: Enrollment::new(store.clone(), store.clone(), clock),
      store,
    }
  }
}

/// Shorthand for the extractor every handler takes.
pub type SharedState<S> = axum::extract::State<Arc<AppState<S>>>;

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store` on wall-clock time.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: LearnStore>(store: Arc<S>) -> Router<()> {
  api_router_with_clock(store, Clock::System)
}

pub fn api_router_with_clock<S: LearnStore>(
  store: Arc<S>,
  clock: Clock,
) -> Router<()> {
  let state = Arc::new(AppState::new(store, clock));

  Router::new()
    // Learner progress
    .route("/users/{user_id}/journeys", get(progress::list_journeys::<S>))
    .route(
      "/users/{user_id}/journeys/{journey_id}/progress",
      get(progress::snapshot::<S>),
    )
    .route(
      "/users/{user_id}/journeys/{journey_id}/completed-topics",
      get(progress::completed_topics::<S>),
    )
    .route(
      "/users/{user_id}/journeys/{journey_id}/next-topic",
      get(progress::next_topic::<S>),
    )
    .route(
      "/users/{user_id}/journeys/{journey_id}/start",
      post(progress::start::<S>),
    )
    .route(
      "/users/{user_id}/journeys/{journey_id}/complete",
      post(progress::complete::<S>),
    )
    // Activities
    .route(
      "/users/{user_id}/topics/{topic_id}/flashcards/complete",
      post(activity::complete_flashcards::<S>),
    )
    .route(
      "/users/{user_id}/topics/{topic_id}/quiz/submit",
      post(activity::submit_quiz::<S>),
    )
    .route(
      "/users/{user_id}/topics/{topic_id}/progress",
      get(activity::topic_progress::<S>),
    )
    // Assignments
    .route("/journeys/{journey_id}/assignments", get(assignments::list::<S>))
    .route("/journeys/{journey_id}/assign", post(assignments::assign::<S>))
    .route("/journeys/{journey_id}/unassign", post(assignments::unassign::<S>))
    // Invitations
    .route(
      "/journeys/{journey_id}/invitations",
      get(invitations::list::<S>).post(invitations::create::<S>),
    )
    .route(
      "/journeys/{journey_id}/invitations/{invitation_id}",
      delete(invitations::deactivate::<S>),
    )
    .route("/invitations/{token}", get(invitations::details::<S>))
    .route("/invitations/{token}/accept", post(invitations::accept::<S>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
