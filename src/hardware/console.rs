use std::{
    io::{self, BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{Context, Result};

use super::{InputLine, StimulusController};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Draws the LED state on stderr.
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    lit: bool,
}

impl ConsoleIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn render(&self) {
        let glyph = if self.lit { "(*)" } else { "( )" };
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r  LED {glyph}  ");
        let _ = stderr.flush();
    }
}

impl StimulusController for ConsoleIndicator {
    fn activate(&mut self) {
        if !self.lit {
            self.lit = true;
            log_debug!("indicator on");
            self.render();
        }
    }

    fn deactivate(&mut self) {
        if self.lit {
            self.lit = false;
            log_debug!("indicator off");
            self.render();
        }
    }
}

/// Treats each Enter on stdin as a button press.
///
/// A reader thread latches presses; `rearm` clears the latch so a press made
/// before the cue is not credited to the next trial.
#[derive(Debug, Clone)]
pub struct ConsoleButton {
    pressed: Arc<AtomicBool>,
}

impl ConsoleButton {
    pub fn spawn() -> Result<Self> {
        let pressed = Arc::new(AtomicBool::new(false));
        let latch = Arc::clone(&pressed);

        thread::Builder::new()
            .name("reflex-button".into())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    if line.is_err() {
                        break;
                    }
                    latch.store(true, Ordering::SeqCst);
                }
            })
            .context("failed to spawn console button reader")?;

        Ok(Self { pressed })
    }
}

impl InputLine for ConsoleButton {
    fn is_active(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }

    fn rearm(&mut self) {
        self.pressed.store(false, Ordering::SeqCst);
    }
}
