//! Capture refresh policies and the repeating timer behind them

use std::time::{Duration, Instant};

/// Default interval for [`RefreshPolicy::Continuous`]
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(200);

/// Shortest interval a repeating timer accepts
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// When the backdrop is re-captured
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Re-capture on a fixed interval
    Continuous(Duration),
    /// Capture the first time a texture is requested, then keep it until
    /// invalidated
    Once,
    /// Capture only after an explicit invalidate
    Manual,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        RefreshPolicy::Continuous(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshPolicy {
    /// Interval of the repeating timer this policy needs, if any
    pub fn interval(&self) -> Option<Duration> {
        match self {
            RefreshPolicy::Continuous(interval) => Some((*interval).max(MIN_REFRESH_INTERVAL)),
            RefreshPolicy::Once | RefreshPolicy::Manual => None,
        }
    }

    /// Parse `continuous`, `once` or `manual` (case-insensitive)
    ///
    /// `continuous` uses `interval`, or the default when `None`.
    pub fn parse(name: &str, interval: Option<Duration>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "continuous" => Some(RefreshPolicy::Continuous(
                interval.unwrap_or(DEFAULT_REFRESH_INTERVAL),
            )),
            "once" => Some(RefreshPolicy::Once),
            "manual" => Some(RefreshPolicy::Manual),
            _ => None,
        }
    }
}

/// Deadline-driven repeating timer
///
/// The host event loop asks for [`next_fire`](Self::next_fire) and sleeps until
/// then. A late poll fires once and skips the missed periods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepeatingTimer {
    interval: Duration,
    next_fire: Instant,
}

impl RepeatingTimer {
    /// Arm a timer whose first fire is one interval after `now`
    pub fn start(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        Self {
            interval,
            next_fire: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_fire(&self) -> Instant {
        self.next_fire
    }

    /// Returns true if the timer was due, advancing it past `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_fire {
            return false;
        }
        // next multiple of the interval strictly after `now`, however late
        let late = now.duration_since(self.next_fire);
        let phase = late.as_nanos() % self.interval.as_nanos();
        self.next_fire = now + (self.interval - duration_from_nanos(phase));
        true
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}
