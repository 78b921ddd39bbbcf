//! Ctrl-C handling across the life of a run.
//!
//! Once tokio installs a SIGINT handler it stays installed for the whole
//! process, so the default "terminate" behaviour has to be restored by hand
//! after the trials are over.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Exit status conventionally used for SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Stop the session at the next trial boundary.
    StopSession,
    /// Terminate the process.
    Exit,
}

#[derive(Debug, Clone)]
pub struct InterruptGuard {
    session_token: CancellationToken,
    measuring: Arc<AtomicBool>,
}

impl InterruptGuard {
    pub fn new(session_token: CancellationToken) -> Self {
        Self {
            session_token,
            measuring: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Called once the last trial has returned.
    pub fn finish_measuring(&self) {
        self.measuring.store(false, Ordering::SeqCst);
    }

    /// The first interrupt during trials stops the session; any other exits.
    pub fn on_interrupt(&self) -> InterruptAction {
        if self.measuring.load(Ordering::SeqCst) && !self.session_token.is_cancelled() {
            self.session_token.cancel();
            InterruptAction::StopSession
        } else {
            InterruptAction::Exit
        }
    }

    pub fn spawn(&self) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match guard.on_interrupt() {
                    InterruptAction::StopSession => {
                        log_warn!("Interrupt received; stopping after the current trial");
                    }
                    InterruptAction::Exit => {
                        log_warn!("Interrupted");
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            }
        })
    }
}
