//! Error taxonomy for measurement, persistence and sync.

use std::{io, path::PathBuf};

/// Bad session parameters; rejected before any hardware is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputValidationError {
    #[error("trial count must be at least 1")]
    ZeroTrials,

    #[error("response window must be longer than 0 ms")]
    ZeroWindow,

    #[error("invalid inter-trial delay range {min_secs}s..={max_secs}s")]
    InvalidDelayRange { min_secs: f64, max_secs: f64 },

    #[error("clock period of {period_ms} ms cannot measure a {window_ms} ms window")]
    ClockPeriodTooShort { period_ms: u64, window_ms: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session parameters: {0}")]
    Invalid(#[from] InputValidationError),

    #[error("session cancelled after {completed} trial(s)")]
    Cancelled { completed: usize },
}

/// Local backup failed. The caller still attempts remote sync.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to create results directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode result record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Which leg of the read-modify-write a sync failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Write,
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStage::Fetch => f.write_str("fetch"),
            SyncStage::Write => f.write_str("write"),
        }
    }
}

/// Remote merge failed; the local backup is the recovery path.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("remote store is not configured (missing project id)")]
    NotConfigured,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid document URL: {0}")]
    InvalidUrl(String),

    #[error("{stage} request failed: {source}")]
    Transport {
        stage: SyncStage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} returned HTTP {status}: {body}")]
    Status {
        stage: SyncStage,
        status: u16,
        body: String,
    },

    #[error("document changed since it was read (HTTP {status}): {body}")]
    Conflict { status: u16, body: String },

    #[error("malformed remote document: {0}")]
    MalformedResponse(String),
}

impl SyncError {
    /// HTTP status when the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Status { status, .. } | SyncError::Conflict { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
