//! Deadline calculator — translates an urgency tier into an absolute dispatch time.

use chrono::{DateTime, Duration, Utc};

use herald_common::types::UrgencyTier;

/// How far after submission a tier's dispatch units become due.
pub fn delay_for(tier: UrgencyTier) -> Duration {
    match tier {
        UrgencyTier::Instant => Duration::zero(),
        UrgencyTier::OneHour => Duration::hours(1),
        UrgencyTier::OneDay => Duration::days(1),
    }
}

/// Absolute time at which units submitted at `now` with `tier` may run.
pub fn deadline(tier: UrgencyTier, now: DateTime<Utc>) -> DateTime<Utc> {
    now + delay_for(tier)
}
