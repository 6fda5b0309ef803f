//! Core type definitions for the affinity core.
//!
//! Every persisted type serializes to the JSON layout of the per-user
//! records: beliefs as `{ tag: { weight, last_reinforced } }` and log entries
//! as flat objects with a `YYYY-MM-DD HH:MM:SS` timestamp.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Identifier of the person whose affinities are tracked.
///
/// Raw names are reduced to `[A-Za-z0-9_]` so they are safe to embed in file
/// names; a name with nothing left falls back to `"user"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Name used when sanitization leaves nothing.
    pub const FALLBACK: &'static str = "user";

    /// Sanitize a raw user name into an identifier.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if cleaned.is_empty() {
            Self(Self::FALLBACK.to_string())
        } else {
            Self(cleaned)
        }
    }

    /// The sanitized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a log entry.
///
/// New entries get a UUID v4, but stored ids are opaque strings: any id
/// already present in a log is read back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Create a new random entry ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// Emotional valence of an interaction.
///
/// Parsing is lenient: any label other than `positive` or `negative`
/// (including labels read back from a stored log) is [`Emotion::Neutral`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Emotion {
    /// Upbeat response.
    Positive,
    /// Neither clearly positive nor negative.
    #[default]
    Neutral,
    /// Downbeat response.
    Negative,
}

impl Emotion {
    /// Resolve a free-form label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    /// Lowercase label as stored on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Beliefs
// ---------------------------------------------------------------------------

/// A weighted affinity toward one tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    /// Weight as of the last decay pass or reinforcement.
    pub weight: f64,
    /// Epoch seconds of the last reinforcement. Decay passes leave it alone.
    pub last_reinforced: f64,
}

impl Belief {
    /// A belief freshly reinforced at `now`.
    #[must_use]
    pub fn new(weight: f64, now: f64) -> Self {
        Self {
            weight,
            last_reinforced: now,
        }
    }
}

/// Per-user belief map, keyed and ordered by tag.
pub type AffinityMap = BTreeMap<String, Belief>;

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// On-disk format of [`MemoryEntry::timestamp`].
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

mod log_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::LOG_TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(LOG_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, LOG_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One immutable interaction record.
///
/// Fields are read-only once constructed; the log only ever appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    id: EntryId,
    #[serde(with = "log_timestamp")]
    timestamp: NaiveDateTime,
    question: String,
    response: String,
    emotion: Emotion,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    belief_tags: Vec<String>,
}

impl MemoryEntry {
    /// Build an entry with a fresh identifier.
    ///
    /// Sub-second precision is dropped from `timestamp` so the entry equals
    /// its own persisted form.
    #[must_use]
    pub fn new(
        timestamp: NaiveDateTime,
        question: impl Into<String>,
        response: impl Into<String>,
        emotion: Emotion,
        tags: Vec<String>,
        belief_tags: Vec<String>,
    ) -> Self {
        use chrono::Timelike;
        Self {
            id: EntryId::new(),
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            question: question.into(),
            response: response.into(),
            emotion,
            tags,
            belief_tags,
        }
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> &EntryId {
        &self.id
    }

    /// Local wall-clock time of the interaction.
    #[must_use]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// What the user said or asked.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// What the assistant answered.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Valence classified from the response.
    #[must_use]
    pub fn emotion(&self) -> Emotion {
        self.emotion
    }

    /// Caller-supplied tags, in the order given.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Tags extracted from the question and response.
    #[must_use]
    pub fn belief_tags(&self) -> &[String] {
        &self.belief_tags
    }
}

impl fmt::Display for MemoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (ID: {})",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.id
        )?;
        writeln!(f, "User: {}", self.question)?;
        writeln!(f, "AI:   {}", self.response)?;
        write!(f, "Emotion: {}", self.emotion)?;
        if !self.tags.is_empty() {
            write!(f, "\nTags: {}", self.tags.join(", "))?;
        }
        if !self.belief_tags.is_empty() {
            write!(f, "\nBeliefs: {}", self.belief_tags.join(", "))?;
        }
        Ok(())
    }
}
