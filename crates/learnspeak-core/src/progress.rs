//! Progress events and the rules derived from them.
//!
//! Completion is never stored. It is re-derived from the raw events on every
//! read, so there is nothing to invalidate when a new event arrives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::TopicSummary;

// ─── Events ──────────────────────────────────────────────────────────────────

/// The learning activity a progress event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
  Flashcard,
  Quiz,
}

impl ActivityType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Flashcard => "flashcard",
      Self::Quiz => "quiz",
    }
  }
}

/// A learner finishing (or attempting) one activity for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
  pub event_id:           Uuid,
  pub user_id:            Uuid,
  pub topic_id:           Uuid,
  pub journey_id:         Option<Uuid>,
  pub activity_type:      ActivityType,
  pub completed:          bool,
  pub score:              Option<f64>,
  pub time_spent_seconds: u32,
  pub completed_at:       Option<DateTime<Utc>>,
  /// Server-assigned creation time.
  pub recorded_at:        DateTime<Utc>,
}

/// Input to [`crate::store::ProgressStore::create_progress_event`] and
/// [`crate::store::ProgressStore::record_flashcard_completion`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProgressEvent {
  pub user_id:            Uuid,
  pub topic_id:           Uuid,
  pub journey_id:         Option<Uuid>,
  pub activity_type:      ActivityType,
  pub completed:          bool,
  pub score:              Option<f64>,
  pub time_spent_seconds: u32,
  pub completed_at:       Option<DateTime<Utc>>,
}

// ─── Derived views ───────────────────────────────────────────────────────────

/// Completion counts for one user in one journey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JourneyProgress {
  pub total_topics:     usize,
  pub completed_topics: usize,
  pub progress_percent: f64,
}

impl JourneyProgress {
  pub fn new(total_topics: usize, completed_topics: usize) -> Self {
    Self {
      total_topics,
      completed_topics,
      progress_percent: progress_percent(completed_topics, total_topics),
    }
  }
}

/// The full derived state handed to callers. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
  pub total_topics:     usize,
  pub completed_topics: usize,
  pub progress_percent: f64,
  /// `None` once every topic is completed.
  pub next_topic:       Option<TopicSummary>,
}

impl ProgressSnapshot {
  pub fn new(progress: JourneyProgress, next_topic: Option<TopicSummary>) -> Self {
    Self {
      total_topics: progress.total_topics,
      completed_topics: progress.completed_topics,
      progress_percent: progress.progress_percent,
      next_topic,
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// A topic is completed iff a completed flashcard event exists and, when the
/// topic has quizzes, a completed quiz event exists too.
///
/// `quiz_events` is not consulted when `quiz_count == 0`.
pub fn topic_completed(
  flashcard_events: &[ProgressEvent],
  quiz_count: u32,
  quiz_events: &[ProgressEvent],
) -> bool {
  let flashcards_done = flashcard_events.iter().any(|e| e.completed);
  if !flashcards_done {
    return false;
  }
  quiz_count == 0 || quiz_events.iter().any(|e| e.completed)
}

/// `completed / total × 100`, rounded half-up to one decimal place; `0` for
/// an empty journey.
pub fn progress_percent(completed: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  // Tenths of a percent, rounded half-up in integer arithmetic.
  let (completed, total) = (completed as u64, total as u64);
  let tenths = (completed * 2000 + total) / (2 * total);
  tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
  use super::*;

  fn event(activity_type: ActivityType, completed: bool) -> ProgressEvent {
    ProgressEvent {
      event_id: Uuid::new_v4(),
      user_id: Uuid::nil(),
      topic_id: Uuid::nil(),
      journey_id: None,
      activity_type,
      completed,
      score: None,
      time_spent_seconds: 0,
      completed_at: None,
      recorded_at: Utc::now(),
    }
  }

  #[test]
  fn zero_quiz_topic_needs_only_flashcards() {
    let flash = [event(ActivityType::Flashcard, true)];
    assert!(topic_completed(&flash, 0, &[]));
  }

  #[test]
  fn quiz_events_ignored_without_quizzes() {
    let flash = [event(ActivityType::Flashcard, true)];
    let failed = [event(ActivityType::Quiz, false)];
    assert!(topic_completed(&flash, 0, &failed));
  }

  #[test]
  fn quiz_topic_needs_both() {
    let flash = [event(ActivityType::Flashcard, true)];
    let passed = [event(ActivityType::Quiz, true)];
    assert!(!topic_completed(&flash, 2, &[]));
    assert!(!topic_completed(&[], 2, &passed));
    assert!(topic_completed(&flash, 2, &passed));
  }

  #[test]
  fn failed_attempts_do_not_count() {
    let flash = [event(ActivityType::Flashcard, true)];
    let attempts = [
      event(ActivityType::Quiz, false),
      event(ActivityType::Quiz, false),
    ];
    assert!(!topic_completed(&flash, 1, &attempts));

    let with_pass = [
      event(ActivityType::Quiz, false),
      event(ActivityType::Quiz, true),
    ];
    assert!(topic_completed(&flash, 1, &with_pass));
  }

  #[test]
  fn incomplete_flashcards_block_completion() {
    let flash = [event(ActivityType::Flashcard, false)];
    assert!(!topic_completed(&flash, 0, &[]));
  }

  #[test]
  fn percent_guards_empty_journey() {
    assert_eq!(progress_percent(0, 0), 0.0);
  }

  #[test]
  fn percent_rounds_to_one_decimal() {
    assert_eq!(progress_percent(1, 3), 33.3);
    assert_eq!(progress_percent(2, 3), 66.7);
    assert_eq!(progress_percent(1, 2), 50.0);
    assert_eq!(progress_percent(1, 8), 12.5);
    assert_eq!(progress_percent(4, 4), 100.0);
  }

  #[test]
  fn percent_exact_halves_round_up() {
    assert_eq!(progress_percent(23, 80), 28.8);
    assert_eq!(progress_percent(41, 80), 51.3);
    assert_eq!(progress_percent(51, 80), 63.8);
    assert_eq!(progress_percent(1, 16), 6.3);
    assert_eq!(progress_percent(1, 200), 0.5);
  }

  #[test]
  fn snapshot_finished_when_no_next_topic() {
    let snapshot = ProgressSnapshot::new(JourneyProgress::new(2, 2), None);
    assert!(snapshot.next_topic.is_none());
    assert_eq!(snapshot.progress_percent, 100.0);
  }
}
