//! Interaction Log: append-only record of question/response exchanges.
//!
//! `record` is the entry point the rest of the assistant calls after every
//! exchange. It classifies the response, extracts belief tags from the whole
//! exchange, appends the entry, and (when tags were found) reinforces the
//! user's beliefs.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::belief::BeliefStore;
use crate::clock::{Clock, local_naive};
use crate::config::AffinityConfig;
use crate::emotion::{EmotionClassifier, EmotionThresholds};
use crate::error::Result;
use crate::persistence::Storage;
use crate::tags::TagExtractor;
use crate::types::{Emotion, MemoryEntry, UserId};

/// One user's interaction log, driving that user's [`BeliefStore`].
#[derive(Debug, Clone)]
pub struct MemoryLog {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    classifier: EmotionClassifier,
    extractor: TagExtractor,
    beliefs: BeliefStore,
}

impl MemoryLog {
    /// Open the log for the owner of `beliefs`, creating it on first use.
    ///
    /// # Errors
    /// Returns [`crate::AffinityError::Corrupt`] if the existing log is
    /// unparseable.
    pub fn open(
        beliefs: BeliefStore,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        classifier: EmotionClassifier,
        extractor: TagExtractor,
    ) -> Result<Self> {
        let existing = storage.load_log(beliefs.user())?;
        debug!(user = %beliefs.user(), entries = existing.len(), "Memory log opened");
        Ok(Self {
            storage,
            clock,
            classifier,
            extractor,
            beliefs,
        })
    }

    /// Open the belief store and log for `user` using `config`.
    ///
    /// # Errors
    /// Returns an error if either record is unreadable or corrupt.
    pub fn from_config(
        user: UserId,
        storage: Arc<dyn Storage>,
        config: &AffinityConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let beliefs = BeliefStore::open(
            user,
            Arc::clone(&storage),
            config.beliefs.clone(),
            Arc::clone(&clock),
        )?;
        Self::open(
            beliefs,
            storage,
            clock,
            EmotionClassifier::new(EmotionThresholds::from(&config.emotion)),
            TagExtractor::from_config(&config.tags),
        )
    }

    /// Log one exchange and reinforce any belief tags it mentions.
    ///
    /// The log is written before the beliefs; if reinforcement fails the
    /// entry stays logged and the error is returned.
    ///
    /// # Errors
    /// Returns a storage error if either record cannot be read or written.
    pub fn record(
        &self,
        question: &str,
        response: &str,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryEntry> {
        let (score, emotion) = self.classifier.analyze(response);
        let belief_tags = self.extractor.extract(&format!("{question} {response}"));

        let entry = MemoryEntry::new(
            local_naive(self.clock.now()),
            question,
            response,
            emotion,
            tags.unwrap_or_default(),
            belief_tags,
        );

        let mut entries = self.storage.load_log(self.user())?;
        entries.push(entry.clone());
        self.storage.save_log(self.user(), &entries)?;

        debug!(
            user = %self.user(),
            id = %entry.id(),
            polarity = score,
            emotion = %emotion,
            belief_tags = ?entry.belief_tags(),
            "Recorded interaction"
        );

        if !entry.belief_tags().is_empty() {
            self.beliefs.reinforce(entry.belief_tags(), emotion)?;
        }
        Ok(entry)
    }

    /// Every entry, oldest first.
    ///
    /// # Errors
    /// Returns a storage error if the log cannot be read.
    pub fn all(&self) -> Result<Vec<MemoryEntry>> {
        self.storage.load_log(self.user())
    }

    /// Entries whose caller-supplied tags include `tag`.
    ///
    /// # Errors
    /// Returns a storage error if the log cannot be read.
    pub fn query_by_tag(&self, tag: &str) -> Result<Vec<MemoryEntry>> {
        self.filter(|e| e.tags().iter().any(|t| t == tag))
    }

    /// Entries classified as `emotion`.
    ///
    /// # Errors
    /// Returns a storage error if the log cannot be read.
    pub fn query_by_emotion(&self, emotion: Emotion) -> Result<Vec<MemoryEntry>> {
        self.filter(|e| e.emotion() == emotion)
    }

    /// Entries whose extracted belief tags include `tag`.
    ///
    /// # Errors
    /// Returns a storage error if the log cannot be read.
    pub fn query_by_belief_tag(&self, tag: &str) -> Result<Vec<MemoryEntry>> {
        self.filter(|e| e.belief_tags().iter().any(|t| t == tag))
    }

    fn filter(&self, keep: impl Fn(&MemoryEntry) -> bool) -> Result<Vec<MemoryEntry>> {
        let mut entries = self.all()?;
        entries.retain(|e| keep(e));
        Ok(entries)
    }

    /// Human-readable listing of the whole log.
    ///
    /// # Errors
    /// Returns a storage error if the log cannot be read.
    pub fn render(&self) -> Result<String> {
        let entries = self.all()?;
        if entries.is_empty() {
            return Ok("Memory log is empty!".to_string());
        }
        let mut out = String::from("--- Memory Log ---\n");
        for (i, entry) in entries.iter().enumerate() {
            let _ = writeln!(out, "\n[{}] {entry}", i + 1);
        }
        out.push_str("\n--- End of Log ---");
        Ok(out)
    }

    /// The belief store this log reinforces.
    #[must_use]
    pub fn beliefs(&self) -> &BeliefStore {
        &self.beliefs
    }

    /// Owner of this log.
    #[must_use]
    pub fn user(&self) -> &UserId {
        self.beliefs.user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::{JsonFileStorage, RecordKind};

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: Arc<JsonFileStorage>,
        clock: ManualClock,
        log: MemoryLog,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Arc::new(JsonFileStorage::open(dir.path()).expect("open"));
        let clock = ManualClock::at_epoch_secs(1_700_000_000);
        let log = MemoryLog::from_config(
            UserId::new("ada"),
            storage.clone(),
            &AffinityConfig::default(),
            Arc::new(clock.clone()),
        )
        .expect("log");
        Fixture {
            _dir: dir,
            storage,
            clock,
            log,
        }
    }

    #[test]
    fn record_extracts_trust_and_reinforces() {
        let f = fixture();
        let entry = f.log.record("Q", "I trust you fully", None).expect("record");

        assert_eq!(entry.belief_tags(), ["loyal_collaboration".to_string()]);
        assert_eq!(entry.emotion(), Emotion::Neutral);
        assert!(entry.tags().is_empty());

        let beliefs = f.log.beliefs().all().expect("beliefs");
        assert!((beliefs["loyal_collaboration"] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn emotion_comes_from_response_only() {
        let f = fixture();
        let entry = f
            .log
            .record("This is terrible", "What a wonderful sense of purpose", None)
            .expect("record");
        assert_eq!(entry.emotion(), Emotion::Positive);
        assert_eq!(entry.belief_tags(), ["shared_purpose".to_string()]);
        let beliefs = f.log.beliefs().all().expect("beliefs");
        assert!((beliefs["shared_purpose"] - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tags_come_from_question_and_response() {
        let f = fixture();
        let entry = f
            .log
            .record("Tell me about discipline", "It builds a legacy", None)
            .expect("record");
        assert_eq!(
            entry.belief_tags(),
            ["legacy_creation".to_string(), "discipline".to_string()]
        );
    }

    #[test]
    fn no_tags_means_no_belief_write() {
        let f = fixture();
        f.log.beliefs().reinforce(&["x"], Emotion::Positive).expect("seed");
        f.clock.advance_secs(500);
        f.log.record("hello", "hi there", None).expect("record");

        // No reinforcement happened, so no decay pass pruned "x".
        let snapshot = f.log.beliefs().snapshot().expect("snapshot");
        assert!((snapshot["x"].weight - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn caller_tags_are_kept_in_order() {
        let f = fixture();
        let entry = f
            .log
            .record("q", "r", Some(vec!["chat".to_string(), "evening".to_string()]))
            .expect("record");
        assert_eq!(entry.tags(), ["chat".to_string(), "evening".to_string()]);
    }

    #[test]
    fn entries_persist_in_insertion_order() {
        let f = fixture();
        let recorded_at = local_naive(f.clock.now());
        let first = f.log.record("one", "first", None).expect("1");
        f.clock.advance_secs(5);
        let second = f.log.record("two", "second", None).expect("2");

        let all = f.log.all().expect("all");
        assert_eq!(all, vec![first.clone(), second]);

        let raw = std::fs::read_to_string(f.storage.record_path(f.log.user(), RecordKind::Log))
            .expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value[0]["id"], first.id().to_string());
        assert_eq!(value[0]["question"], "one");
        let stored = chrono::NaiveDateTime::parse_from_str(
            value[0]["timestamp"].as_str().expect("timestamp string"),
            crate::types::LOG_TIMESTAMP_FORMAT,
        )
        .expect("timestamp in log format");
        assert_eq!(stored, recorded_at);
        assert_eq!(stored, first.timestamp());
    }

    #[test]
    fn queries_filter_and_preserve_order() {
        let f = fixture();
        f.log
            .record("a", "I love it", Some(vec!["mood".to_string()]))
            .expect("a");
        f.log.record("b", "about trust", None).expect("b");
        f.log
            .record("c", "this is awful, no trust", Some(vec!["mood".to_string()]))
            .expect("c");

        let mood: Vec<_> = f.log.query_by_tag("mood").expect("tag");
        assert_eq!(
            mood.iter().map(MemoryEntry::question).collect::<Vec<_>>(),
            vec!["a", "c"]
        );

        let positive = f.log.query_by_emotion(Emotion::Positive).expect("emotion");
        assert_eq!(positive.len(), 1);
        assert_eq!(positive[0].question(), "a");

        let trust = f.log.query_by_belief_tag("loyal_collaboration").expect("belief");
        assert_eq!(
            trust.iter().map(MemoryEntry::question).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert!(f.log.query_by_tag("missing").expect("none").is_empty());
    }

    #[test]
    fn negative_response_reinforces_with_half_weight() {
        let f = fixture();
        f.log
            .record("Do you trust me?", "I feel miserable", None)
            .expect("record");
        let beliefs = f.log.beliefs().all().expect("beliefs");
        assert!((beliefs["loyal_collaboration"] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn render_lists_entries() {
        let f = fixture();
        assert_eq!(f.log.render().expect("render"), "Memory log is empty!");

        f.log
            .record("Q1", "independence matters", Some(vec!["t".to_string()]))
            .expect("record");
        let text = f.log.render().expect("render");
        assert!(text.starts_with("--- Memory Log ---"));
        assert!(text.contains("[1] "));
        assert!(text.contains("User: Q1"));
        assert!(text.contains("Beliefs: creative_independence"));
        assert!(text.ends_with("--- End of Log ---"));
    }

    #[test]
    fn corrupt_log_fails_record_without_touching_beliefs() {
        let f = fixture();
        std::fs::write(
            f.storage.record_path(f.log.user(), RecordKind::Log),
            "{ this is not a list",
        )
        .expect("corrupt");

        let err = f.log.record("trust", "trust", None).expect_err("should fail");
        assert!(matches!(err, crate::AffinityError::Corrupt { record: "log", .. }));
        assert!(f.log.beliefs().all().expect("beliefs").is_empty());
    }
}
