//! Journey assignments and their status lifecycle.
//!
//! `assigned → in_progress → completed`. Reaching 100 % progress does not
//! move an assignment to `completed`; that is always an explicit call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
  #[default]
  Assigned,
  InProgress,
  Completed,
}

impl AssignmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Assigned => "assigned",
      Self::InProgress => "in_progress",
      Self::Completed => "completed",
    }
  }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

/// A user's enrolment in one journey. At most one per (user, journey).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyAssignment {
  pub assignment_id: Uuid,
  pub user_id:       Uuid,
  pub journey_id:    Uuid,
  /// The instructor (or invitation creator) who enrolled the user.
  pub assigned_by:   Uuid,
  pub status:        AssignmentStatus,
  pub assigned_at:   DateTime<Utc>,
  pub started_at:    Option<DateTime<Utc>>,
  pub completed_at:  Option<DateTime<Utc>>,
}

impl JourneyAssignment {
  /// `assigned → in_progress`. Any other starting status is left untouched.
  ///
  /// Returns whether the assignment changed.
  pub fn start(&mut self, at: DateTime<Utc>) -> bool {
    if self.status != AssignmentStatus::Assigned {
      return false;
    }
    self.status = AssignmentStatus::InProgress;
    self.started_at = Some(at);
    true
  }

  /// Move to `completed` from any status.
  pub fn complete(&mut self, at: DateTime<Utc>) {
    self.status = AssignmentStatus::Completed;
    self.completed_at = Some(at);
  }
}

/// The stored assignment after a status write, and whether the write moved
/// it. A start on an assignment that is already past `assigned` leaves it
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub assignment: JourneyAssignment,
  pub changed:    bool,
}

/// Input to [`crate::store::AssignmentStore::insert_assignment`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub user_id:     Uuid,
  pub journey_id:  Uuid,
  pub assigned_by: Uuid,
  pub assigned_at: DateTime<Utc>,
}

// ─── Listing ─────────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request, normalised on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub page:      u32,
  pub page_size: u32,
}

impl Page {
  /// Missing or zero values fall back to page 1 / 20 per page; sizes above
  /// 100 are capped.
  pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = page_size
      .filter(|s| *s > 0)
      .unwrap_or(DEFAULT_PAGE_SIZE)
      .min(MAX_PAGE_SIZE);
    Self { page, page_size }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }

  pub fn total_pages(&self, total: u64) -> u64 {
    total.div_ceil(u64::from(self.page_size))
  }
}

impl Default for Page {
  fn default() -> Self { Self::new(None, None) }
}

/// Parameters for [`crate::store::AssignmentStore::list_assignments`].
/// Results are ordered newest `assigned_at` first.
#[derive(Debug, Clone, Default)]
pub struct AssignmentQuery {
  pub user_id:    Option<Uuid>,
  pub journey_id: Option<Uuid>,
  pub status:     Option<AssignmentStatus>,
  pub page:       Page,
}

/// One page of results plus the paging envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
  pub items:       Vec<T>,
  pub total:       u64,
  pub page:        u32,
  pub page_size:   u32,
  pub total_pages: u64,
}

impl<T> Paged<T> {
  pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
    Self {
      items,
      total,
      page: page.page,
      page_size: page.page_size,
      total_pages: page.total_pages(total),
    }
  }
}
