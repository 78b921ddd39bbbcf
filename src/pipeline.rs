//! Hands a scored record to local storage and then to the remote store.

use std::path::PathBuf;

use crate::{
    error::{PersistError, SyncError},
    models::ResultRecord,
    storage::LocalStore,
    sync::{RemoteSync, SyncReceipt},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug)]
pub struct PublishReport {
    pub session_key: String,
    pub local: Result<PathBuf, PersistError>,
    pub remote: Result<SyncReceipt, SyncError>,
}

impl PublishReport {
    pub fn is_complete(&self) -> bool {
        self.local.is_ok() && self.remote.is_ok()
    }
}

/// Writes the local backup first, then merges remotely regardless of how the
/// local write went. Neither failure is escalated.
pub async fn publish(
    record: &ResultRecord,
    store: &LocalStore,
    remote: &RemoteSync,
    user_id: &str,
) -> PublishReport {
    let session_key = record.session_key();

    let local = store.save(record);
    if let Err(err) = &local {
        log_error!("Failed to write local backup: {}", err);
    }

    let remote = remote.sync(user_id, record, &session_key).await;
    match (&remote, &local) {
        (Ok(receipt), _) => log_info!(
            "Synced {} ({} session(s) on record)",
            receipt.session_key,
            receipt.field_count
        ),
        (Err(err), Ok(path)) => log_warn!(
            "Failed to upload results: {}; kept locally at {}",
            err,
            path.display()
        ),
        (Err(err), Err(_)) => log_error!("Failed to upload results: {}; no copy was kept", err),
    }

    PublishReport {
        session_key,
        local,
        remote,
    }
}
