//! Emotion Classifier: lexicon polarity → valence label
//!
//! Scores text on a continuous polarity scale in `[-1, 1]` and buckets the
//! score into [`Emotion`] with fixed cut-offs.
//!
//! Scoring: each word found in the lexicon contributes its polarity.
//! Intensifiers ("very", "slightly", ...) scale the next scored word,
//! negators ("not", "never", "…n't") flip it and halve it. The text's score is
//! the mean of its scored words; text with no lexicon words scores `0.0`.
//!
//! Two cut-off sets exist in the assistant and they disagree on purpose:
//! the interaction log uses `±0.3` (exclusive) while casual chat uses a
//! compound score with `±0.1` (inclusive). Both are exposed as constants on
//! [`EmotionThresholds`].

use crate::config::EmotionConfig;
use crate::types::Emotion;

/// Word polarities, sorted by word for binary search.
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("angry", -0.5),
    ("annoyed", -0.4),
    ("annoying", -0.6),
    ("awesome", 1.0),
    ("awful", -1.0),
    ("bad", -0.7),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("boring", -1.0),
    ("brilliant", 0.9),
    ("broken", -0.4),
    ("calm", 0.3),
    ("cheerful", 0.8),
    ("confused", -0.4),
    ("cool", 0.35),
    ("delighted", 0.7),
    ("depressed", -0.6),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("dreadful", -1.0),
    ("excellent", 1.0),
    ("excited", 0.4),
    ("fail", -0.5),
    ("failed", -0.5),
    ("fantastic", 0.4),
    ("fine", 0.4),
    ("fun", 0.3),
    ("glad", 0.5),
    ("good", 0.7),
    ("grateful", 0.6),
    ("great", 0.8),
    ("happy", 0.8),
    ("hate", -0.8),
    ("helpful", 0.5),
    ("hopeless", -0.8),
    ("horrible", -1.0),
    ("interesting", 0.5),
    ("kind", 0.6),
    ("lonely", -0.5),
    ("love", 0.5),
    ("lovely", 0.5),
    ("mad", -0.6),
    ("miserable", -1.0),
    ("nice", 0.6),
    ("pleasant", 0.73),
    ("poor", -0.4),
    ("proud", 0.8),
    ("sad", -0.5),
    ("scared", -0.6),
    ("sorry", -0.5),
    ("stupid", -0.8),
    ("terrible", -1.0),
    ("thankful", 0.5),
    ("thanks", 0.2),
    ("tired", -0.4),
    ("ugly", -0.7),
    ("unhappy", -0.6),
    ("upset", -0.6),
    ("useful", 0.3),
    ("useless", -0.5),
    ("wonderful", 1.0),
    ("worried", -0.5),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

/// Words that scale the next scored word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("fairly", 0.8),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("rather", 0.9),
    ("really", 1.3),
    ("slightly", 0.5),
    ("so", 1.3),
    ("somewhat", 0.7),
    ("super", 1.3),
    ("too", 1.2),
    ("totally", 1.4),
    ("very", 1.3),
];

const NEGATORS: &[&str] = &["cannot", "neither", "never", "no", "nor", "not", "nothing"];

/// Factor applied to a negated word's polarity.
const NEGATION_FACTOR: f64 = -0.5;

fn lookup(table: &[(&str, f64)], word: &str) -> Option<f64> {
    table
        .binary_search_by(|(w, _)| (*w).cmp(word))
        .ok()
        .map(|i| table[i].1)
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

/// Continuous polarity of `text` in `[-1, 1]`.
#[must_use]
pub fn polarity(text: &str) -> f64 {
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    let mut total = 0.0;
    let mut scored = 0_u32;
    let mut modifier = 1.0;
    let mut negated = false;

    for word in lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
    {
        if is_negator(word) {
            negated = true;
            continue;
        }
        if let Some(factor) = lookup(INTENSIFIERS, word) {
            modifier *= factor;
            continue;
        }
        if let Some(p) = lookup(LEXICON, word) {
            let mut score = (p * modifier).clamp(-1.0, 1.0);
            if negated {
                score *= NEGATION_FACTOR;
            }
            total += score;
            scored += 1;
        }
        modifier = 1.0;
        negated = false;
    }

    if scored == 0 {
        0.0
    } else {
        (total / f64::from(scored)).clamp(-1.0, 1.0)
    }
}

/// Score cut-offs between neutral and the two valenced labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionThresholds {
    /// Upper cut-off.
    pub positive: f64,
    /// Lower cut-off.
    pub negative: f64,
    /// Whether a score equal to a cut-off already counts as valenced.
    pub inclusive: bool,
}

impl EmotionThresholds {
    /// Cut-offs used when logging interactions: `> 0.3` / `< -0.3`.
    pub const LOG: Self = Self {
        positive: 0.3,
        negative: -0.3,
        inclusive: false,
    };

    /// Cut-offs of the casual-chat mood check: `>= 0.1` / `<= -0.1`.
    ///
    /// Not used by the log; kept so the chat layer can share the classifier
    /// without silently adopting the log's cut-offs.
    pub const CHAT: Self = Self {
        positive: 0.1,
        negative: -0.1,
        inclusive: true,
    };

    /// Bucket a polarity score.
    #[must_use]
    pub fn classify(&self, score: f64) -> Emotion {
        let (is_pos, is_neg) = if self.inclusive {
            (score >= self.positive, score <= self.negative)
        } else {
            (score > self.positive, score < self.negative)
        };
        if is_pos {
            Emotion::Positive
        } else if is_neg {
            Emotion::Negative
        } else {
            Emotion::Neutral
        }
    }
}

impl Default for EmotionThresholds {
    fn default() -> Self {
        Self::LOG
    }
}

impl From<&EmotionConfig> for EmotionThresholds {
    fn from(config: &EmotionConfig) -> Self {
        Self {
            positive: config.positive_threshold,
            negative: config.negative_threshold,
            inclusive: false,
        }
    }
}

/// Text → [`Emotion`] classifier with configurable cut-offs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionClassifier {
    thresholds: EmotionThresholds,
}

impl EmotionClassifier {
    /// Classifier with explicit cut-offs.
    #[must_use]
    pub fn new(thresholds: EmotionThresholds) -> Self {
        Self { thresholds }
    }

    /// Cut-offs in use.
    #[must_use]
    pub fn thresholds(&self) -> EmotionThresholds {
        self.thresholds
    }

    /// Score and label in one call.
    #[must_use]
    pub fn analyze(&self, text: &str) -> (f64, Emotion) {
        let score = polarity(text);
        (score, self.thresholds.classify(score))
    }

    /// Label only.
    #[must_use]
    pub fn classify(&self, text: &str) -> Emotion {
        self.analyze(text).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_sorted_for_binary_search() {
        assert!(LEXICON.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(INTENSIFIERS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn empty_and_unscored_text_is_zero() {
        assert!(polarity("").abs() < f64::EPSILON);
        assert!(polarity("I trust you fully").abs() < f64::EPSILON);
        assert!(polarity("1234 ...").abs() < f64::EPSILON);
    }

    #[test]
    fn single_words_take_lexicon_value() {
        assert!((polarity("That was great") - 0.8).abs() < 1e-9);
        assert!((polarity("Terrible!") + 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_mean_of_scored_words() {
        // (0.7 + -0.7) / 2
        assert!(polarity("good and bad").abs() < 1e-9);
        // (0.8 + 0.6) / 2
        assert!((polarity("happy and nice") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn intensifier_scales_and_clamps() {
        assert!((polarity("very good") - 0.91).abs() < 1e-9);
        assert!((polarity("extremely excellent") - 1.0).abs() < 1e-9);
        assert!((polarity("slightly good") - 0.35).abs() < 1e-9);
    }

    #[test]
    fn negation_flips_and_dampens() {
        assert!((polarity("not good") + 0.35).abs() < 1e-9);
        assert!((polarity("I don't hate it") - 0.4).abs() < 1e-9);
        assert!((polarity("I don\u{2019}t hate it") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn modifiers_reset_after_each_word() {
        // "not" applies to "really good" only; "happy" is unmodified.
        let score = polarity("not really good, but happy");
        let expected = (0.91 * -0.5 + 0.8) / 2.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn log_thresholds_are_exclusive() {
        let t = EmotionThresholds::LOG;
        assert_eq!(t.classify(0.31), Emotion::Positive);
        assert_eq!(t.classify(0.3), Emotion::Neutral);
        assert_eq!(t.classify(-0.3), Emotion::Neutral);
        assert_eq!(t.classify(-0.31), Emotion::Negative);
    }

    #[test]
    fn chat_thresholds_differ_from_log() {
        let score = 0.2;
        assert_eq!(EmotionThresholds::CHAT.classify(score), Emotion::Positive);
        assert_eq!(EmotionThresholds::LOG.classify(score), Emotion::Neutral);
        assert_eq!(EmotionThresholds::CHAT.classify(-0.1), Emotion::Negative);
    }

    #[test]
    fn classifier_labels_responses() {
        let classifier = EmotionClassifier::default();
        assert_eq!(classifier.classify("This is wonderful news"), Emotion::Positive);
        assert_eq!(classifier.classify("What an awful day"), Emotion::Negative);
        assert_eq!(classifier.classify("The meeting is at noon"), Emotion::Neutral);
        assert_eq!(classifier.classify("not good"), Emotion::Negative);
    }

    #[test]
    fn thresholds_from_config() {
        let config = EmotionConfig {
            positive_threshold: 0.5,
            negative_threshold: -0.2,
        };
        let t = EmotionThresholds::from(&config);
        assert_eq!(t.classify(0.45), Emotion::Neutral);
        assert_eq!(t.classify(-0.25), Emotion::Negative);
    }
}
