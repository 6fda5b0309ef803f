//! Configuration for the affinity core.
//!
//! Maps directly to `affinity.toml`. Every field has a serde default, so an
//! empty document yields [`AffinityConfig::default`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AffinityError, Result};
use crate::types::Emotion;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Belief decay and reinforcement tuning.
    #[serde(default)]
    pub beliefs: BeliefConfig,
    /// Emotion classification cut-offs.
    #[serde(default)]
    pub emotion: EmotionConfig,
    /// Keyword → tag table.
    #[serde(default)]
    pub tags: TagConfig,
    /// Storage backend settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl AffinityConfig {
    /// Load configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns [`AffinityError::Config`] if the TOML is invalid or a value is
    /// out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| AffinityError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check every range constraint.
    ///
    /// # Errors
    /// Returns [`AffinityError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let b = &self.beliefs;
        if !(0.0..1.0).contains(&b.decay_rate) {
            return Err(AffinityError::Config(format!(
                "beliefs.decay_rate must be in [0, 1), got {}",
                b.decay_rate
            )));
        }
        if !b.prune_threshold.is_finite() || b.prune_threshold < 0.0 {
            return Err(AffinityError::Config(format!(
                "beliefs.prune_threshold must be a non-negative number, got {}",
                b.prune_threshold
            )));
        }
        for (name, value) in [
            ("positive_multiplier", b.positive_multiplier),
            ("neutral_multiplier", b.neutral_multiplier),
            ("negative_multiplier", b.negative_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AffinityError::Config(format!(
                    "beliefs.{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let e = &self.emotion;
        if e.negative_threshold > e.positive_threshold {
            return Err(AffinityError::Config(format!(
                "emotion.negative_threshold ({}) exceeds positive_threshold ({})",
                e.negative_threshold, e.positive_threshold
            )));
        }

        for rule in &self.tags.keywords {
            if rule.keyword.trim().is_empty() || rule.tag.trim().is_empty() {
                return Err(AffinityError::Config(
                    "tags.keywords entries need a non-empty keyword and tag".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when `RUST_LOG` is unset: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Decay and reinforcement constants for the belief store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefConfig {
    /// Fractional decay per elapsed second, compounded as `(1 - rate)^secs`.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// Beliefs whose decayed weight falls below this are removed.
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
    /// Reinforcement added for a positive interaction.
    #[serde(default = "default_positive_multiplier")]
    pub positive_multiplier: f64,
    /// Reinforcement added for a neutral interaction.
    #[serde(default = "default_neutral_multiplier")]
    pub neutral_multiplier: f64,
    /// Reinforcement added for a negative interaction.
    #[serde(default = "default_negative_multiplier")]
    pub negative_multiplier: f64,
}

impl BeliefConfig {
    /// Reinforcement amount for the given emotion.
    #[must_use]
    pub fn multiplier(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Positive => self.positive_multiplier,
            Emotion::Neutral => self.neutral_multiplier,
            Emotion::Negative => self.negative_multiplier,
        }
    }
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_decay_rate(),
            prune_threshold: default_prune_threshold(),
            positive_multiplier: default_positive_multiplier(),
            neutral_multiplier: default_neutral_multiplier(),
            negative_multiplier: default_negative_multiplier(),
        }
    }
}

/// Polarity cut-offs for the interaction-log classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// Scores strictly above this are positive.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    /// Scores strictly below this are negative.
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
        }
    }
}

/// How keywords are located in text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Keyword may appear anywhere, including inside a longer word.
    #[default]
    Substring,
    /// Keyword must start at a word boundary ("trust" hits "trusted", not "distrust").
    WordBoundary,
}

/// One row of the keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Text to look for (matched case-insensitively).
    pub keyword: String,
    /// Belief tag emitted on a match.
    pub tag: String,
}

impl KeywordRule {
    /// Build a rule.
    #[must_use]
    pub fn new(keyword: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            tag: tag.into(),
        }
    }
}

/// Keyword table for the tag extractor. Order is significant: extracted
/// tags come back in table order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    /// Matching strategy.
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Keyword → tag rules.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<KeywordRule>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            keywords: default_keywords(),
        }
    }
}

/// Which storage engine backs the per-user records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One pair of pretty-printed JSON files per user.
    #[default]
    Json,
    /// A single SQLite database holding every user's records.
    Sqlite,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "json" or "sqlite".
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory holding JSON files or the SQLite database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir` (SQLite backend only).
    #[serde(default = "default_database_file")]
    pub database_file: String,
    /// Use WAL mode for concurrent reads (SQLite backend only).
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store and verify a CRC-32 per record (SQLite backend only).
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_decay_rate() -> f64 { 0.01 }
fn default_prune_threshold() -> f64 { 0.1 }
fn default_positive_multiplier() -> f64 { 1.5 }
fn default_neutral_multiplier() -> f64 { 1.0 }
fn default_negative_multiplier() -> f64 { 0.5 }
fn default_positive_threshold() -> f64 { 0.3 }
fn default_negative_threshold() -> f64 { -0.3 }
fn default_data_dir() -> PathBuf { PathBuf::from(".") }
fn default_database_file() -> String { "affinity.db".to_string() }

fn default_keywords() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("legacy", "legacy_creation"),
        KeywordRule::new("discipline", "discipline"),
        KeywordRule::new("trust", "loyal_collaboration"),
        KeywordRule::new("independence", "creative_independence"),
        KeywordRule::new("purpose", "shared_purpose"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = AffinityConfig::from_toml("").expect("parse");
        assert!((config.beliefs.decay_rate - 0.01).abs() < f64::EPSILON);
        assert!((config.beliefs.prune_threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.tags.keywords.len(), 5);
        assert_eq!(config.tags.match_mode, MatchMode::Substring);
        assert_eq!(config.persistence.backend, StorageBackend::Json);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AffinityConfig::from_toml(
            r#"
            [beliefs]
            decay_rate = 0.001

            [tags]
            match_mode = "word_boundary"

            [persistence]
            backend = "sqlite"
            data_dir = "/tmp/affinity"
            "#,
        )
        .expect("parse");
        assert!((config.beliefs.decay_rate - 0.001).abs() < f64::EPSILON);
        assert!((config.beliefs.positive_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.tags.match_mode, MatchMode::WordBoundary);
        assert_eq!(config.tags.keywords[2].tag, "loyal_collaboration");
        assert_eq!(config.persistence.backend, StorageBackend::Sqlite);
        assert_eq!(config.persistence.data_dir, PathBuf::from("/tmp/affinity"));
        assert_eq!(config.persistence.database_file, "affinity.db");
    }

    #[test]
    fn custom_keyword_table_replaces_default() {
        let config = AffinityConfig::from_toml(
            r#"
            [tags]
            keywords = [ { keyword = "honor", tag = "integrity" } ]
            "#,
        )
        .expect("parse");
        assert_eq!(config.tags.keywords, vec![KeywordRule::new("honor", "integrity")]);
    }

    #[test]
    fn out_of_range_decay_rate_is_rejected() {
        let err = AffinityConfig::from_toml("[beliefs]\ndecay_rate = 1.0").expect_err("should be rejected");
        assert!(matches!(err, AffinityError::Config(msg) if msg.contains("decay_rate")));
    }

    #[test]
    fn inverted_emotion_thresholds_are_rejected() {
        let err = AffinityConfig::from_toml(
            "[emotion]\npositive_threshold = -0.5\nnegative_threshold = 0.5",
        )
        .expect_err("should be rejected");
        assert!(matches!(err, AffinityError::Config(_)));
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let err = AffinityConfig::from_toml(
            "[tags]\nkeywords = [ { keyword = \" \", tag = \"x\" } ]",
        )
        .expect_err("should be rejected");
        assert!(matches!(err, AffinityError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = AffinityConfig::from_toml("[beliefs\n").expect_err("should be rejected");
        assert!(matches!(err, AffinityError::Config(_)));
    }

    #[test]
    fn multiplier_per_emotion() {
        let beliefs = BeliefConfig::default();
        assert!((beliefs.multiplier(Emotion::Positive) - 1.5).abs() < f64::EPSILON);
        assert!((beliefs.multiplier(Emotion::Neutral) - 1.0).abs() < f64::EPSILON);
        assert!((beliefs.multiplier(Emotion::Negative) - 0.5).abs() < f64::EPSILON);
    }
}
