//! Scriptable hardware for tests.

use std::{cell::Cell, time::Duration};

use tokio::time::Instant;

use super::{InputLine, StimulusController};
use crate::timer::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedEvent {
    On,
    Off,
}

#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub lit: bool,
    pub events: Vec<LedEvent>,
}

impl StimulusController for RecordingIndicator {
    fn activate(&mut self) {
        self.lit = true;
        self.events.push(LedEvent::On);
    }

    fn deactivate(&mut self) {
        self.lit = false;
        self.events.push(LedEvent::Off);
    }
}

/// Presses the button a fixed delay after each rearm; `None` never presses.
#[derive(Debug)]
pub struct ScriptedInput {
    presses: Vec<Option<Duration>>,
    trial: Option<usize>,
    armed_at: Instant,
    pub rearms: usize,
}

impl ScriptedInput {
    pub fn new(presses_ms: &[Option<u64>]) -> Self {
        Self {
            presses: presses_ms
                .iter()
                .map(|press| press.map(Duration::from_millis))
                .collect(),
            trial: None,
            armed_at: Instant::now(),
            rearms: 0,
        }
    }
}

impl InputLine for ScriptedInput {
    fn is_active(&self) -> bool {
        let Some(trial) = self.trial else {
            return false;
        };
        match self.presses.get(trial) {
            Some(Some(after)) => Instant::now().duration_since(self.armed_at) >= *after,
            _ => false,
        }
    }

    fn rearm(&mut self) {
        self.trial = Some(self.trial.map_or(0, |t| t + 1));
        self.armed_at = Instant::now();
        self.rearms += 1;
    }
}

/// Input that is always pressed.
#[derive(Debug, Default)]
pub struct HeldInput;

impl InputLine for HeldInput {
    fn is_active(&self) -> bool {
        true
    }
}

/// Clock that advances a fixed step on every read.
#[derive(Debug)]
pub struct StepClock {
    now: Cell<u64>,
    step: u64,
    period: u64,
}

impl StepClock {
    pub fn new(start: u64, step: u64, period: u64) -> Self {
        Self {
            now: Cell::new(start % period),
            step,
            period,
        }
    }
}

impl Clock for StepClock {
    fn ticks_ms(&self) -> u64 {
        let current = self.now.get();
        self.now.set((current + self.step) % self.period);
        current
    }

    fn period_ms(&self) -> u64 {
        self.period
    }
}
