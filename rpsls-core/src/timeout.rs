//! Deadline arithmetic for forfeiture claims.
//!
//! All timestamps are unix seconds as reported by the ledger. Nothing here
//! caches "now"; call again on every poll.

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// System time shifted by a fixed number of seconds. Backs the sandbox and
/// the CLI's `advance` command; tests use it with a frozen base.
#[derive(Debug, Default)]
pub struct OffsetClock {
    base: Option<u64>,
    offset: AtomicI64,
}

impl OffsetClock {
    pub fn new(offset_secs: i64) -> Self {
        Self {
            base: None,
            offset: AtomicI64::new(offset_secs),
        }
    }

    /// Clock pinned at `at`, moved only by [`OffsetClock::advance`].
    pub fn frozen(at: u64) -> Self {
        Self {
            base: Some(at),
            offset: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, secs: i64) {
        let _ = self
            .offset
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |offset| {
                Some(offset.saturating_add(secs))
            });
    }

    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> u64 {
        let base = self.base.unwrap_or_else(|| SystemClock.now());
        let base = i64::try_from(base).unwrap_or(i64::MAX);
        base.saturating_add(self.offset()).max(0) as u64
    }
}

/// Time left before a stalled party may be forfeited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Remaining(Duration),
    Elapsed,
}

impl TimeRemaining {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeRemaining::Elapsed)
    }

    pub fn as_secs(&self) -> u64 {
        match self {
            TimeRemaining::Remaining(d) => d.as_secs(),
            TimeRemaining::Elapsed => 0,
        }
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRemaining::Elapsed => f.write_str("Timeout reached"),
            TimeRemaining::Remaining(d) => {
                let secs = d.as_secs();
                write!(f, "{}m {}s", secs / 60, secs % 60)
            }
        }
    }
}

fn deadline(last_action: u64, timeout: u64) -> u64 {
    last_action.saturating_add(timeout)
}

/// `now > last_action + timeout`: the deadline second itself is still in time.
pub fn has_timed_out_at(now: u64, last_action: u64, timeout: u64) -> bool {
    now > deadline(last_action, timeout)
}

pub fn has_timed_out(last_action: u64, timeout: u64) -> bool {
    has_timed_out_at(SystemClock.now(), last_action, timeout)
}

/// Remaining time is reported as elapsed from the deadline second onwards,
/// one second before a claim actually becomes valid.
pub fn time_remaining_at(now: u64, last_action: u64, timeout: u64) -> TimeRemaining {
    let deadline = deadline(last_action, timeout);
    if now >= deadline {
        TimeRemaining::Elapsed
    } else {
        TimeRemaining::Remaining(Duration::from_secs(deadline - now))
    }
}

pub fn time_remaining(last_action: u64, timeout: u64) -> TimeRemaining {
    time_remaining_at(SystemClock.now(), last_action, timeout)
}
