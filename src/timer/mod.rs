pub mod clock;

pub use clock::{ticks_diff, Clock, MonotonicClock, DEFAULT_PERIOD_MS};
