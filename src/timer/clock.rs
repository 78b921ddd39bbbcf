use std::time::Duration;

use tokio::time::Instant;

/// Rollover period of a 32-bit millisecond tick counter (~49.7 days).
pub const DEFAULT_PERIOD_MS: u64 = 1 << 32;

/// Monotonic millisecond tick source.
///
/// Ticks live in `[0, period_ms())` and wrap back to zero at the period, the
/// way a hardware timer counter does. Never compare two ticks directly; use
/// [`ticks_diff`] or [`Clock::elapsed_since`].
pub trait Clock {
    fn ticks_ms(&self) -> u64;

    fn period_ms(&self) -> u64 {
        DEFAULT_PERIOD_MS
    }

    /// Milliseconds from `start` to now, correct across one rollover.
    fn elapsed_since(&self, start: u64) -> u64 {
        ticks_diff(self.ticks_ms(), start, self.period_ms())
    }
}

/// Forward distance from `start` to `end` on a counter that wraps at `period`.
///
/// Valid as long as the real interval is shorter than one period.
pub fn ticks_diff(end: u64, start: u64, period: u64) -> u64 {
    let period = period.max(1);
    let (end, start) = (end % period, start % period);
    if end >= start {
        end - start
    } else {
        period - start + end
    }
}

/// Platform clock backed by the runtime's monotonic instant.
///
/// Ticks are folded into the configured period so the rollover path is the
/// same one a device counter would take.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    period_ms: u64,
    offset_ms: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD_MS)
    }

    pub fn with_period(period_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            period_ms: period_ms.max(1),
            offset_ms: 0,
        }
    }

    /// Starts the counter at `offset_ms` instead of zero.
    pub fn starting_at(mut self, offset_ms: u64) -> Self {
        self.offset_ms = offset_ms % self.period_ms;
        self
    }

    fn since_origin(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn ticks_ms(&self) -> u64 {
        let period = u128::from(self.period_ms);
        let raw = self.since_origin().as_millis() + u128::from(self.offset_ms);
        // Result is < period_ms, which fits in u64.
        (raw % period) as u64
    }

    fn period_ms(&self) -> u64 {
        self.period_ms
    }
}
