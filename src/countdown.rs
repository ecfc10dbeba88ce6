//! Countdown timers for time-limited views
//!
//! A [`Countdown`] measures the time left until a deadline and renders it as
//! `DD:HH:MM:SS`. [`Countdown::ticks`] turns it into a stream that ends once
//! the deadline passes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

/// Shortest period accepted by [`Countdown::ticks`]
pub const MIN_TICK_PERIOD: std::time::Duration = std::time::Duration::from_millis(1);

/// Remaining time split into display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CountdownParts {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CountdownParts {
    /// Split a duration, flooring negatives to zero and dropping sub-second precision
    pub fn from_duration(remaining: Duration) -> Self {
        let total = remaining.num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for CountdownParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    deadline: DateTime<Utc>,
}

impl Countdown {
    pub fn new(deadline: DateTime<Utc>) -> Self {
        Self { deadline }
    }

    /// Countdown ending `duration` from now
    pub fn starting_now(duration: Duration) -> Self {
        Self::new(Utc::now() + duration)
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Time left at `now`; zero once the deadline has passed
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).max(Duration::zero())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    pub fn parts_at(&self, now: DateTime<Utc>) -> CountdownParts {
        CountdownParts::from_duration(self.remaining_at(now))
    }

    pub fn remaining(&self) -> CountdownParts {
        self.parts_at(Utc::now())
    }

    /// Readings every `period`, starting immediately. The final item is the
    /// first zero reading. Periods below [`MIN_TICK_PERIOD`] are raised to it.
    pub fn ticks(self, period: std::time::Duration) -> impl Stream<Item = CountdownParts> {
        let mut finished = false;
        let interval = tokio::time::interval(period.max(MIN_TICK_PERIOD));
        IntervalStream::new(interval).map_while(move |_| {
            if finished {
                return None;
            }
            let parts = self.parts_at(Utc::now());
            finished = parts.is_zero();
            Some(parts)
        })
    }
}
