use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{validate_clock_period, validate_delay_range, SessionConfig},
    error::{InputValidationError, SessionError},
    hardware::{InputLine, StimulusController},
    models::Session,
    timer::Clock,
};

use super::capture::ResponseCapture;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Runs stimulus/response trials on hardware it owns for its whole lifetime.
pub struct TrialSequencer<S, I, C, R = StdRng> {
    config: SessionConfig,
    stimulus: S,
    input: I,
    clock: C,
    rng: R,
    cancel_token: CancellationToken,
}

impl<S, I, C> TrialSequencer<S, I, C, StdRng>
where
    S: StimulusController,
    I: InputLine,
    C: Clock,
{
    pub fn new(
        config: SessionConfig,
        stimulus: S,
        input: I,
        clock: C,
    ) -> Result<Self, InputValidationError> {
        config.validate()?;
        validate_clock_period(clock.period_ms(), config.window_ms)?;

        Ok(Self {
            config,
            stimulus,
            input,
            clock,
            rng: StdRng::from_entropy(),
            cancel_token: CancellationToken::new(),
        })
    }
}

impl<S, I, C, R> TrialSequencer<S, I, C, R>
where
    S: StimulusController,
    I: InputLine,
    C: Clock,
    R: Rng,
{
    /// Swaps the delay source, e.g. for a seeded generator.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> TrialSequencer<S, I, C, R2> {
        TrialSequencer {
            config: self.config,
            stimulus: self.stimulus,
            input: self.input,
            clock: self.clock,
            rng,
            cancel_token: self.cancel_token,
        }
    }

    /// Token that stops the run at the next trial boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn stimulus(&self) -> &S {
        &self.stimulus
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Operator feedback only; not part of any measurement.
    pub async fn blink(&mut self, count: u32) {
        let interval = self.config.blink_interval();
        for _ in 0..count {
            self.stimulus.activate();
            tokio::time::sleep(interval).await;
            self.stimulus.deactivate();
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn run_configured(&mut self) -> Result<Session, SessionError> {
        let trials = self.config.trials;
        let range = self.config.delay_range();
        self.run_session(trials, range).await
    }

    /// Runs exactly `n` trials separated by random delays from
    /// `inter_trial_range` (seconds).
    ///
    /// A miss is a recorded outcome, never retried. Cancellation is honoured
    /// only between trials, and a cancelled run yields no session.
    pub async fn run_session(
        &mut self,
        n: u32,
        inter_trial_range: (f64, f64),
    ) -> Result<Session, SessionError> {
        if n == 0 {
            return Err(InputValidationError::ZeroTrials.into());
        }
        validate_delay_range(inter_trial_range)?;

        let window_ms = self.config.window_ms;
        let poll_interval = self.config.poll_interval();
        let token = self.cancel_token.clone();
        let mut session = Session::with_capacity(window_ms, n as usize);

        for _ in 0..n {
            if token.is_cancelled() {
                return Err(SessionError::Cancelled {
                    completed: session.len(),
                });
            }

            let delay = self.random_delay(inter_trial_range);
            log_debug!("next stimulus in {} ms", delay.as_millis());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => {
                    log_info!("session cancelled after {} trial(s)", session.len());
                    return Err(SessionError::Cancelled { completed: session.len() });
                }
            }

            self.input.rearm();
            self.stimulus.activate();
            let outcome =
                ResponseCapture::new(&mut self.stimulus, &self.input, &self.clock, poll_interval)
                    .await_response(window_ms)
                    .await;
            self.stimulus.deactivate();

            let trial = session.record(outcome);
            match trial.outcome.elapsed_ms() {
                Some(ms) => log_info!("trial {}: {} ms", trial.index + 1, ms),
                None => log_info!("trial {}: miss", trial.index + 1),
            }
        }

        Ok(session)
    }

    fn random_delay(&mut self, (min_secs, max_secs): (f64, f64)) -> Duration {
        let secs = if min_secs < max_secs {
            self.rng.gen_range(min_secs..=max_secs)
        } else {
            min_secs
        };
        Duration::from_secs_f64(secs)
    }
}
