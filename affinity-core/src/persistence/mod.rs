//! Persistence adapter for per-user records.
//!
//! Every user owns two JSON documents:
//!
//! - **beliefs**: `{ tag: { "weight": f64, "last_reinforced": f64 } }`
//! - **log**: `[ { id, timestamp, question, response, emotion, tags, belief_tags } ]`
//!
//! A backend only moves whole documents as bytes ([`Storage::read_record`] /
//! [`Storage::write_record`]); the typed load/save methods are provided on top.
//! Reads and writes are all-or-nothing:
//!
//! - a missing record is created empty and read back as empty;
//! - an unparseable record fails with [`AffinityError::Corrupt`] and is left
//!   untouched on disk.

mod json;
mod sqlite;

pub use json::JsonFileStorage;
pub use sqlite::SqliteStorage;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{PersistenceConfig, StorageBackend};
use crate::error::{AffinityError, Result};
use crate::types::{AffinityMap, MemoryEntry, UserId};

/// The two documents kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Belief weights.
    Beliefs,
    /// Interaction log.
    Log,
}

impl RecordKind {
    /// Stable name used in database keys and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beliefs => "beliefs",
            Self::Log => "log",
        }
    }

    /// File name suffix for the JSON backend (`{user}_{suffix}`).
    #[must_use]
    pub fn file_suffix(self) -> &'static str {
        match self {
            Self::Beliefs => "belief_model.json",
            Self::Log => "memory_log.json",
        }
    }

    /// Document written when a record is first created.
    #[must_use]
    pub fn empty_document(self) -> &'static [u8] {
        match self {
            Self::Beliefs => b"{}",
            Self::Log => b"[]",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable home for per-user records.
pub trait Storage: Send + Sync + fmt::Debug {
    /// Raw bytes of a record, or `None` if it was never written.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn read_record(&self, user: &UserId, kind: RecordKind) -> Result<Option<Vec<u8>>>;

    /// Replace a record with `data` in one step.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn write_record(&self, user: &UserId, kind: RecordKind, data: &[u8]) -> Result<()>;

    /// Load a user's belief map, creating an empty record on first use.
    ///
    /// # Errors
    /// Returns [`AffinityError::Corrupt`] if the stored document is unparseable.
    fn load_beliefs(&self, user: &UserId) -> Result<AffinityMap> {
        load_or_init(self, user, RecordKind::Beliefs)
    }

    /// Overwrite a user's belief map.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    fn save_beliefs(&self, user: &UserId, beliefs: &AffinityMap) -> Result<()> {
        self.write_record(user, RecordKind::Beliefs, &encode(beliefs)?)
    }

    /// Load a user's interaction log, creating an empty record on first use.
    ///
    /// # Errors
    /// Returns [`AffinityError::Corrupt`] if the stored document is unparseable.
    fn load_log(&self, user: &UserId) -> Result<Vec<MemoryEntry>> {
        load_or_init(self, user, RecordKind::Log)
    }

    /// Overwrite a user's interaction log.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    fn save_log(&self, user: &UserId, entries: &[MemoryEntry]) -> Result<()> {
        self.write_record(user, RecordKind::Log, &encode(&entries)?)
    }
}

/// Open the backend selected in `config`.
///
/// # Errors
/// Returns an error if the data directory or database cannot be opened.
pub fn open_storage(config: &PersistenceConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Json => Ok(Arc::new(JsonFileStorage::open(&config.data_dir)?)),
        StorageBackend::Sqlite => {
            std::fs::create_dir_all(&config.data_dir)?;
            let path = config.data_dir.join(&config.database_file);
            Ok(Arc::new(SqliteStorage::open(path, config)?))
        }
    }
}

/// Pretty-print with four-space indentation, matching the on-disk layout.
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| AffinityError::Serialization(e.to_string()))?;
    Ok(out)
}

fn decode<T: DeserializeOwned>(user: &UserId, kind: RecordKind, data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| AffinityError::Corrupt {
        record: kind.as_str(),
        user: user.to_string(),
        reason: e.to_string(),
    })
}

fn load_or_init<S, T>(storage: &S, user: &UserId, kind: RecordKind) -> Result<T>
where
    S: Storage + ?Sized,
    T: DeserializeOwned,
{
    if let Some(data) = storage.read_record(user, kind)? {
        return decode(user, kind, &data);
    }
    debug!(user = %user, record = %kind, "Initializing empty record");
    storage.write_record(user, kind, kind.empty_document())?;
    decode(user, kind, kind.empty_document())
}
