//! Clock abstraction so services can be driven with deterministic time.

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for the services in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
  /// Wall-clock time.
  #[default]
  System,
  /// Always returns the same instant.
  Fixed(DateTime<Utc>),
}

impl Clock {
  pub fn fixed(at: DateTime<Utc>) -> Self { Self::Fixed(at) }

  pub fn now(&self) -> DateTime<Utc> {
    match self {
      Self::System => Utc::now(),
      Self::Fixed(at) => *at,
    }
  }

  /// Move a fixed clock forward. No effect on [`Clock::System`].
  pub fn advance(&mut self, delta: Duration) {
    if let Self::Fixed(at) = self {
      *at += delta;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_clock_advances() {
    let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let mut clock = Clock::fixed(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::days(2));
    assert_eq!(clock.now(), start + Duration::days(2));
  }

  #[test]
  fn system_clock_ignores_advance() {
    let mut clock = Clock::System;
    clock.advance(Duration::days(365));
    assert!(clock.now() <= Utc::now());
  }
}
