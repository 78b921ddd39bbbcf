//! JSON backup-of-record for each scored session.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::PersistError,
    models::{ResultRecord, SESSION_KEY_PREFIX},
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where `record` is (or would be) written.
    pub fn path_for(&self, record: &ResultRecord) -> PathBuf {
        self.dir
            .join(format!("{}.{EXTENSION}", record.session_key()))
    }

    /// Writes `record` as `score-<timestamp>.json`.
    ///
    /// Two saves within the same second share a filename; the later one wins.
    pub fn save(&self, record: &ResultRecord) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(record);
        let serialized = serde_json::to_string_pretty(record).map_err(PersistError::Encode)?;
        fs::write(&path, serialized).map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;

        log_info!("Wrote results to {}", path.display());
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<ResultRecord, PersistError> {
        let contents = fs::read_to_string(path).map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Backup files in the store, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, PersistError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| PersistError::Read {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PersistError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if is_backup_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn is_backup_file(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SESSION_KEY_PREFIX));
    let has_extension = path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION);
    has_prefix && has_extension
}
