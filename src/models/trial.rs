//! Per-trial outcomes and the session that collects them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Outcome {
    /// Button pressed `elapsed_ms` after the stimulus came on.
    Hit { elapsed_ms: u32 },
    /// No press before the response window closed.
    Miss,
}

impl Outcome {
    pub fn elapsed_ms(&self) -> Option<u32> {
        match self {
            Outcome::Hit { elapsed_ms } => Some(*elapsed_ms),
            Outcome::Miss => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trial {
    pub index: usize,
    pub outcome: Outcome,
}

/// Ordered trials of one run.
///
/// Only the sequencer can append; once handed off the session is read-only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Session {
    window_ms: u32,
    trials: Vec<Trial>,
}

impl Session {
    pub(crate) fn with_capacity(window_ms: u32, capacity: usize) -> Self {
        Self {
            window_ms,
            trials: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome) -> Trial {
        let trial = Trial {
            index: self.trials.len(),
            outcome,
        };
        self.trials.push(trial);
        trial
    }

    /// Builds a session from already-measured outcomes, e.g. a replayed log.
    pub fn from_outcomes(window_ms: u32, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let mut session = Self::with_capacity(window_ms, 0);
        for outcome in outcomes {
            session.record(outcome);
        }
        session
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Elapsed times of every hit, in trial order.
    pub fn hit_times(&self) -> impl Iterator<Item = u32> + '_ {
        self.trials.iter().filter_map(|trial| trial.outcome.elapsed_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_assigns_sequential_indices() {
        let session = Session::from_outcomes(
            500,
            [Outcome::Miss, Outcome::Hit { elapsed_ms: 42 }, Outcome::Miss],
        );

        let indices: Vec<usize> = session.trials().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(session.hit_times().collect::<Vec<_>>(), vec![42]);
    }
}
