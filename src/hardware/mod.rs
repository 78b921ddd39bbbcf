//! Seams to the physical indicator and response button.
//!
//! Drivers for real pins live behind these traits; the crate ships a console
//! simulation for hosts without GPIO.

pub mod console;
#[cfg(test)]
pub(crate) mod fake;

pub use console::{ConsoleButton, ConsoleIndicator};

/// Visual (or audible) cue.
///
/// Both calls are immediate and idempotent. A driver fault is not reported
/// here; the platform treats it as fatal.
pub trait StimulusController {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

/// Response button.
pub trait InputLine {
    /// True while the line reads pressed.
    fn is_active(&self) -> bool;

    /// Called right before each stimulus; latched inputs drop stale presses.
    fn rearm(&mut self) {}
}
