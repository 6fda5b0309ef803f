//! SQLite backend for per-user records.
//!
//! Both documents of every user live in one database:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS user_records (
//!     user_id    TEXT NOT NULL,
//!     kind       TEXT NOT NULL,
//!     data       BLOB NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT,
//!     PRIMARY KEY (user_id, kind)
//! );
//! ```
//!
//! - WAL mode for concurrent reads from other processes.
//! - `data` holds the same JSON document the file backend writes, so the
//!   two backends are interchangeable.
//! - Optional CRC-32 checksum detects save corruption (logged, not fatal).

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use super::{RecordKind, Storage};
use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::types::UserId;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS user_records (
    user_id    TEXT NOT NULL,
    kind       TEXT NOT NULL,
    data       BLOB NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT,
    PRIMARY KEY (user_id, kind)
);";

fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(data))
}

/// Handle to an open SQLite database of user records.
///
/// The connection sits behind a mutex so the handle can be shared across
/// threads; each statement runs to completion while holding it.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AffinityError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "SQLite affinity storage opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`crate::AffinityError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl Storage for SqliteStorage {
    fn read_record(&self, user: &UserId, kind: RecordKind) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT data, checksum FROM user_records WHERE user_id = ?1 AND kind = ?2",
        )?;
        let row: Option<(Vec<u8>, Option<String>)> = stmt
            .query_row(params![user.as_str(), kind.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(&data);
                if expected != actual {
                    warn!(
                        user = %user,
                        record = %kind,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, possible save corruption"
                    );
                }
            }
        }

        debug!(user = %user, record = %kind, bytes = data.len(), "Read record");
        Ok(Some(data))
    }

    fn write_record(&self, user: &UserId, kind: RecordKind, data: &[u8]) -> Result<()> {
        let start = Instant::now();
        let checksum = self.checksum_enabled.then(|| crc32_hex(data));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO user_records (user_id, kind, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, kind) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![user.as_str(), kind.as_str(), data, now, checksum],
        )?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AffinityError;
    use crate::types::{AffinityMap, Belief, Emotion, MemoryEntry};

    fn engine() -> SqliteStorage {
        SqliteStorage::open_in_memory(&PersistenceConfig::default()).expect("open")
    }

    fn sample_beliefs() -> AffinityMap {
        let mut beliefs = AffinityMap::new();
        beliefs.insert("discipline".to_string(), Belief::new(2.5, 1_700_000_000.0));
        beliefs.insert("legacy_creation".to_string(), Belief::new(0.75, 1_700_000_050.5));
        beliefs
    }

    #[test]
    fn round_trip_beliefs_and_log() {
        let storage = engine();
        let user = UserId::new("ada");

        storage.save_beliefs(&user, &sample_beliefs()).expect("save beliefs");
        let entry = MemoryEntry::new(
            chrono::Local::now().naive_local(),
            "Q",
            "I trust you",
            Emotion::Neutral,
            vec![],
            vec!["loyal_collaboration".to_string()],
        );
        storage.save_log(&user, std::slice::from_ref(&entry)).expect("save log");

        assert_eq!(storage.load_beliefs(&user).expect("load"), sample_beliefs());
        assert_eq!(storage.load_log(&user).expect("load"), vec![entry]);
    }

    #[test]
    fn missing_record_is_initialized() {
        let storage = engine();
        let user = UserId::new("new_user");
        assert!(storage.read_record(&user, RecordKind::Log).expect("read").is_none());
        assert!(storage.load_log(&user).expect("load").is_empty());
        let raw = storage.read_record(&user, RecordKind::Log).expect("read");
        assert_eq!(raw.as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn upsert_overwrites() {
        let storage = engine();
        let user = UserId::new("ada");
        storage.save_beliefs(&user, &sample_beliefs()).expect("save 1");
        storage.save_beliefs(&user, &AffinityMap::new()).expect("save 2");
        assert!(storage.load_beliefs(&user).expect("load").is_empty());
    }

    #[test]
    fn corrupt_data_is_an_error() {
        let storage = engine();
        let user = UserId::new("ada");
        storage
            .write_record(&user, RecordKind::Beliefs, b"{\"x\": {\"weight\": ")
            .expect("write");
        let err = storage.load_beliefs(&user).expect_err("should fail");
        assert!(matches!(err, AffinityError::Corrupt { record: "beliefs", .. }));
    }

    #[test]
    fn checksum_mismatch_still_loads() {
        let storage = engine();
        let user = UserId::new("ada");
        storage.save_beliefs(&user, &sample_beliefs()).expect("save");

        storage
            .conn
            .lock()
            .execute(
                "UPDATE user_records SET checksum = 'deadbeef' WHERE user_id = ?1",
                params![user.as_str()],
            )
            .expect("corrupt checksum");

        // The mismatch is only logged.
        assert_eq!(storage.load_beliefs(&user).expect("load"), sample_beliefs());
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PersistenceConfig::default();
        let path = dir.path().join("affinity.db");
        let user = UserId::new("ada");
        {
            let storage = SqliteStorage::open(&path, &config).expect("open");
            storage.save_beliefs(&user, &sample_beliefs()).expect("save");
            assert_eq!(storage.db_path(), path.as_path());
        }

        let reopened = SqliteStorage::open(&path, &config).expect("reopen");
        assert_eq!(reopened.load_beliefs(&user).expect("load"), sample_beliefs());
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32_hex(b"123456789"), "cbf43926");
    }
}
