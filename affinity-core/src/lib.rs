//! # Affinity Core
//!
//! Per-user affinity memory for a conversational assistant. Every
//! question/response exchange is logged, classified for emotion, and scanned
//! for belief keywords; matched beliefs are reinforced in a weight map that
//! decays with wall-clock time.
//!
//! - **Interaction Log** ([`MemoryLog`]): append-only record of exchanges,
//!   the entry point that drives everything else.
//! - **Affinity Store** ([`BeliefStore`]): tag → weight map with compound
//!   decay, emotion-scaled reinforcement and pruning.
//! - **Emotion Classifier** ([`EmotionClassifier`]): lexicon polarity bucketed
//!   into positive / neutral / negative.
//! - **Tag Extractor** ([`TagExtractor`]): keyword table scan.
//! - **Persistence** ([`Storage`]): JSON files or SQLite, whole-document
//!   read/write per user.
//! - **Sessions** ([`SessionRegistry`]): one serialized [`UserSession`] per user.
//!
//! ```no_run
//! use affinity_core::{AffinityConfig, SessionRegistry};
//!
//! # fn main() -> affinity_core::Result<()> {
//! let registry = SessionRegistry::from_config(AffinityConfig::default())?;
//! let session = registry.session("ada")?;
//! let session = session.lock();
//! session.record("Do you trust me?", "I trust you fully", None)?;
//! for (tag, weight) in session.top(3)? {
//!     println!("{tag}: {weight}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod belief;
pub mod clock;
pub mod config;
pub mod decay;
pub mod emotion;
pub mod error;
pub mod memory_log;
pub mod persistence;
pub mod session;
pub mod tags;
pub mod telemetry;
pub mod types;

pub use belief::BeliefStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AffinityConfig;
pub use decay::DecayReport;
pub use emotion::{EmotionClassifier, EmotionThresholds};
pub use error::{AffinityError, Result};
pub use memory_log::MemoryLog;
pub use persistence::{JsonFileStorage, SqliteStorage, Storage, open_storage};
pub use session::{SessionHandle, SessionRegistry, UserSession};
pub use tags::TagExtractor;
pub use types::*;
