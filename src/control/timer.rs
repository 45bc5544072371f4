use chrono::{DateTime, Duration, Utc};

/// Absolute-deadline idle timer.
///
/// Construction leaves the timer unarmed, and an unarmed timer never
/// expires. A reset arms it one full threshold into the future,
/// replacing any earlier deadline, so sleeps that overrun or ticks
/// that arrive late cannot stretch the idle window.
///
/// All decisions take the clock as a parameter (`*_at` methods); the
/// plain variants just pass in `Utc::now()`.
#[derive(Debug, Clone)]
pub struct ShutoffTimer {
    threshold: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl ShutoffTimer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            deadline: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Arm with a fresh full window measured from `now`.
    pub fn reset_at(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.threshold);
    }

    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    /// Expired iff armed and `now` has reached the deadline. Landing
    /// exactly on the deadline counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Minutes until the deadline, clamped at zero once it has passed.
    /// `None` while unarmed; an unarmed timer has no remaining time to
    /// report.
    pub fn minutes_remaining_at(&self, now: DateTime<Utc>) -> Option<f64> {
        let deadline = self.deadline?;
        let remaining = (deadline - now).num_milliseconds() as f64 / 60_000.0;
        Some(remaining.max(0.0))
    }

    pub fn minutes_remaining(&self) -> Option<f64> {
        self.minutes_remaining_at(Utc::now())
    }
}
