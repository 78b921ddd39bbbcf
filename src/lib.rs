pub mod config;
pub mod error;
pub mod hardware;
pub mod interrupt;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod storage;
pub mod sync;
pub mod timer;
pub mod trial;
mod utils;

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use log::{info, warn};

use config::AppConfig;
use hardware::{ConsoleButton, ConsoleIndicator};
use interrupt::InterruptGuard;
use scoring::{summarize, SessionSummary};
use storage::LocalStore;
use sync::RemoteSync;
use timer::MonotonicClock;
use trial::TrialSequencer;

/// Runs one full session: measure, score, back up locally, sync remotely.
pub async fn run() -> Result<()> {
    // Reads RUST_LOG, defaulting to info.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Reflex starting up...");

    let config = AppConfig::from_env().context("failed to load configuration")?;
    if !config.remote.is_configured() {
        warn!("No Firestore project configured; results will only be kept locally");
    }

    let user_id = prompt_user_id()?;

    let button = ConsoleButton::spawn()?;
    let clock = MonotonicClock::with_period(config.session.clock_period_ms);
    let mut sequencer = TrialSequencer::new(
        config.session.clone(),
        ConsoleIndicator::new(),
        button,
        clock,
    )
    .context("invalid session configuration")?;

    let interrupt = InterruptGuard::new(sequencer.cancellation_token());
    interrupt.spawn();

    info!(
        "Press Enter as soon as the LED lights up ({} trials)",
        config.session.trials
    );
    sequencer.blink(config.session.start_blinks).await;
    let session = sequencer.run_configured().await;
    interrupt.finish_measuring();
    let session = session.context("session did not complete")?;
    sequencer.blink(config.session.end_blinks).await;

    let reaction_times: Vec<u32> = session.hit_times().collect();
    let record = summarize(session);
    let summary = SessionSummary {
        record: &record,
        reaction_times: &reaction_times,
    };
    for line in summary.to_string().lines() {
        info!("{line}");
    }

    let store = LocalStore::new(&config.storage.results_dir);
    let remote = RemoteSync::new(config.remote.clone())?;
    let report = pipeline::publish(&record, &store, &remote, &user_id).await;
    if !report.is_complete() {
        warn!("Session {} was not fully published", report.session_key);
    }
    if report.remote.is_err() {
        log_local_backups(&store);
    }

    Ok(())
}

fn log_local_backups(store: &LocalStore) {
    match store.list() {
        Ok(backups) => info!(
            "{} local backup(s) in {}; upload them once the remote store is reachable",
            backups.len(),
            store.dir().display()
        ),
        Err(err) => warn!("Failed to list local backups: {err}"),
    }
}

fn prompt_user_id() -> Result<String> {
    {
        let mut stdout = io::stdout().lock();
        write!(stdout, "Enter your email: ")?;
        stdout.flush()?;
    }

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read user identity")?;

    let user_id = line.trim().to_string();
    if user_id.is_empty() {
        bail!("an email address is required to sync results");
    }
    Ok(user_id)
}
