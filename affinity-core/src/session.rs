//! Per-user sessions and the registry that hands them out.
//!
//! A [`UserSession`] bundles one user's [`MemoryLog`] and [`BeliefStore`].
//! The [`SessionRegistry`] keeps at most one session per user, each behind
//! its own mutex, so every read-modify-write of a user's records runs alone
//! while different users proceed in parallel.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;

use crate::belief::BeliefStore;
use crate::clock::{Clock, SystemClock};
use crate::config::AffinityConfig;
use crate::error::Result;
use crate::memory_log::MemoryLog;
use crate::persistence::{Storage, open_storage};
use crate::types::{MemoryEntry, UserId};

/// Shared handle to one user's session.
pub type SessionHandle = Arc<Mutex<UserSession>>;

/// One user's log and beliefs.
#[derive(Debug)]
pub struct UserSession {
    log: MemoryLog,
}

impl UserSession {
    /// Open (or create) the records of `user`.
    ///
    /// # Errors
    /// Returns an error if either record is unreadable or corrupt.
    pub fn open(
        user: UserId,
        storage: Arc<dyn Storage>,
        config: &AffinityConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            log: MemoryLog::from_config(user, storage, config, clock)?,
        })
    }

    /// See [`MemoryLog::record`].
    ///
    /// # Errors
    /// Returns a storage error if either record cannot be read or written.
    pub fn record(
        &self,
        question: &str,
        response: &str,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryEntry> {
        self.log.record(question, response, tags)
    }

    /// See [`BeliefStore::top`].
    ///
    /// # Errors
    /// Returns a storage error if the belief record cannot be read.
    pub fn top(&self, n: usize) -> Result<Vec<(String, f64)>> {
        self.log.beliefs().top(n)
    }

    /// See [`BeliefStore::all`].
    ///
    /// # Errors
    /// Returns a storage error if the belief record cannot be read.
    pub fn all(&self) -> Result<BTreeMap<String, f64>> {
        self.log.beliefs().all()
    }

    /// Clear the user's beliefs. The interaction log is kept.
    ///
    /// # Errors
    /// Returns a storage error if the belief record cannot be written.
    pub fn reset(&self) -> Result<()> {
        self.log.beliefs().reset()
    }

    /// The user's interaction log.
    #[must_use]
    pub fn log(&self) -> &MemoryLog {
        &self.log
    }

    /// The user's belief store.
    #[must_use]
    pub fn beliefs(&self) -> &BeliefStore {
        self.log.beliefs()
    }

    /// Owner of this session.
    #[must_use]
    pub fn user(&self) -> &UserId {
        self.log.user()
    }
}

/// Hands out one [`SessionHandle`] per user.
#[derive(Debug)]
pub struct SessionRegistry {
    storage: Arc<dyn Storage>,
    config: Arc<AffinityConfig>,
    clock: Arc<dyn Clock>,
    sessions: DashMap<UserId, SessionHandle>,
}

impl SessionRegistry {
    /// Registry over an already-open backend, using the system clock.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: AffinityConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
            sessions: DashMap::new(),
        }
    }

    /// Registry over the backend selected in `config.persistence`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be opened.
    pub fn from_config(config: AffinityConfig) -> Result<Self> {
        let storage = open_storage(&config.persistence)?;
        info!(
            backend = ?config.persistence.backend,
            data_dir = %config.persistence.data_dir.display(),
            "Session registry ready"
        );
        Ok(Self::new(storage, config))
    }

    /// Replace the clock used by sessions opened from now on.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Session for the user named `name` (sanitized via [`UserId::new`]),
    /// opening it on first request.
    ///
    /// Records are read without holding any map lock. If two callers open
    /// the same user at once, the first handle stored wins and both get it.
    ///
    /// # Errors
    /// Returns an error if the user's records are unreadable or corrupt; no
    /// session is cached in that case.
    pub fn session(&self, name: &str) -> Result<SessionHandle> {
        let user = UserId::new(name);
        if let Some(existing) = self.sessions.get(&user) {
            return Ok(Arc::clone(existing.value()));
        }

        let session = UserSession::open(
            user.clone(),
            Arc::clone(&self.storage),
            &self.config,
            Arc::clone(&self.clock),
        )?;
        let handle = self
            .sessions
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        Ok(Arc::clone(handle.value()))
    }

    /// Drop the cached session for `name`. Records on disk are untouched.
    pub fn evict(&self, name: &str) -> bool {
        self.sessions.remove(&UserId::new(name)).is_some()
    }

    /// Users with an open session, sorted.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        users.sort();
        users
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Configuration shared by all sessions.
    #[must_use]
    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Backend shared by all sessions.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}
