//! JSON file backend: `{data_dir}/{user}_belief_model.json` and
//! `{data_dir}/{user}_memory_log.json`.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so a crash mid-write leaves the previous document intact.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{RecordKind, Storage};
use crate::error::Result;
use crate::types::UserId;

/// Directory of per-user JSON documents.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Use `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns [`crate::AffinityError::Io`] if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!(path = %dir.display(), "JSON affinity storage opened");
        Ok(Self { dir })
    }

    /// Location of one user's record.
    #[must_use]
    pub fn record_path(&self, user: &UserId, kind: RecordKind) -> PathBuf {
        self.dir.join(format!("{user}_{}", kind.file_suffix()))
    }

    /// Directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Storage for JsonFileStorage {
    fn read_record(&self, user: &UserId, kind: RecordKind) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(user, kind);
        match std::fs::read(&path) {
            Ok(data) => {
                debug!(user = %user, record = %kind, bytes = data.len(), "Read record");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, user: &UserId, kind: RecordKind, data: &[u8]) -> Result<()> {
        let start = Instant::now();
        let path = self.record_path(user, kind);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(
            user = %user,
            record = %kind,
            bytes = data.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Wrote record"
        );
        Ok(())
    }
}
