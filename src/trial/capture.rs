use std::time::Duration;

use crate::{
    hardware::{InputLine, StimulusController},
    models::Outcome,
    timer::Clock,
};

/// Polls the input line for the length of one response window.
pub struct ResponseCapture<'a, S, I, C> {
    stimulus: &'a mut S,
    input: &'a I,
    clock: &'a C,
    poll_interval: Duration,
}

impl<'a, S, I, C> ResponseCapture<'a, S, I, C>
where
    S: StimulusController,
    I: InputLine,
    C: Clock,
{
    pub fn new(stimulus: &'a mut S, input: &'a I, clock: &'a C, poll_interval: Duration) -> Self {
        Self {
            stimulus,
            input,
            clock,
            poll_interval,
        }
    }

    /// Waits up to `window_ms` for the first press.
    ///
    /// On a press the stimulus is switched off before returning. Elapsed
    /// time is read once per poll, so every `Hit` is strictly inside the
    /// window.
    pub async fn await_response(&mut self, window_ms: u32) -> Outcome {
        let t0 = self.clock.ticks_ms();
        let window = u64::from(window_ms);

        loop {
            let elapsed = self.clock.elapsed_since(t0);
            if elapsed >= window {
                return Outcome::Miss;
            }

            if self.input.is_active() {
                self.stimulus.deactivate();
                // elapsed < window_ms, so it fits in u32.
                return Outcome::Hit {
                    elapsed_ms: elapsed as u32,
                };
            }

            if self.poll_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}
