//! Shareable invitation links that enrol the accepting user in a journey.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Journey;

/// Length in bytes of the random token before hex encoding.
pub const TOKEN_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyInvitation {
  pub invitation_id: Uuid,
  pub journey_id:    Uuid,
  /// Opaque URL-safe token. Unique across all invitations.
  pub token:         String,
  pub created_by:    Uuid,
  pub expires_at:    Option<DateTime<Utc>>,
  /// `None` means unlimited.
  pub max_uses:      Option<u32>,
  pub current_uses:  u32,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

/// Why an invitation can or cannot be accepted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
  Valid,
  Inactive,
  Expired,
  Exhausted,
}

impl Validity {
  pub fn is_valid(self) -> bool { self == Self::Valid }

  /// User-facing explanation for a rejected token.
  pub fn message(self) -> &'static str {
    match self {
      Self::Valid => "This invitation link is valid",
      Self::Exhausted => {
        "This invitation link has reached its maximum usage limit"
      }
      Self::Inactive | Self::Expired => {
        "This invitation link has expired or is no longer valid"
      }
    }
  }
}

impl JourneyInvitation {
  pub fn validity(&self, now: DateTime<Utc>) -> Validity {
    if !self.is_active {
      return Validity::Inactive;
    }
    if self.expires_at.is_some_and(|at| at <= now) {
      return Validity::Expired;
    }
    if self.max_uses.is_some_and(|max| self.current_uses >= max) {
      return Validity::Exhausted;
    }
    Validity::Valid
  }
}

/// Input to [`crate::store::AssignmentStore::create_invitation`]. The store
/// generates the token.
#[derive(Debug, Clone)]
pub struct NewInvitation {
  pub journey_id: Uuid,
  pub created_by: Uuid,
  pub expires_at: Option<DateTime<Utc>>,
  pub max_uses:   Option<u32>,
  pub created_at: DateTime<Utc>,
}

/// What an anonymous visitor sees when opening an invitation link.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationDetails {
  /// `None` when the token is unknown.
  pub journey:     Option<Journey>,
  pub topic_count: usize,
  pub expires_at:  Option<DateTime<Utc>>,
  pub is_valid:    bool,
  /// Set when `is_valid` is false.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:     Option<String>,
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn invitation(now: DateTime<Utc>) -> JourneyInvitation {
    JourneyInvitation {
      invitation_id: Uuid::new_v4(),
      journey_id:    Uuid::new_v4(),
      token:         "abc".into(),
      created_by:    Uuid::new_v4(),
      expires_at:    Some(now + Duration::days(7)),
      max_uses:      Some(2),
      current_uses:  0,
      is_active:     true,
      created_at:    now,
    }
  }

  #[test]
  fn fresh_invitation_is_valid() {
    let now = Utc::now();
    assert_eq!(invitation(now).validity(now), Validity::Valid);
  }

  #[test]
  fn expiry_is_inclusive() {
    let now = Utc::now();
    let inv = invitation(now);
    let at = inv.expires_at.unwrap();
    assert_eq!(inv.validity(at), Validity::Expired);
    assert_eq!(inv.validity(at - Duration::seconds(1)), Validity::Valid);
  }

  #[test]
  fn exhausted_has_its_own_message() {
    let now = Utc::now();
    let mut inv = invitation(now);
    inv.current_uses = 2;
    let v = inv.validity(now);
    assert_eq!(v, Validity::Exhausted);
    assert!(v.message().contains("maximum usage"));
  }

  #[test]
  fn inactive_wins_over_other_reasons() {
    let now = Utc::now();
    let mut inv = invitation(now);
    inv.is_active = false;
    inv.current_uses = 5;
    assert_eq!(inv.validity(now), Validity::Inactive);
  }

  #[test]
  fn unlimited_without_expiry() {
    let now = Utc::now();
    let mut inv = invitation(now);
    inv.expires_at = None;
    inv.max_uses = None;
    inv.current_uses = 10_000;
    assert!(inv.validity(now + Duration::days(3650)).is_valid());
  }
}
