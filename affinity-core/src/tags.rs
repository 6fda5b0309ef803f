//! Tag Extractor: keyword table → belief tags.
//!
//! Case-insensitive scan of free text against an ordered keyword table.
//! No stemming. In [`MatchMode::Substring`] a keyword matches anywhere, so
//! "distrust" yields the "trust" tag; [`MatchMode::WordBoundary`] requires the
//! keyword to start a word.

use crate::config::{KeywordRule, MatchMode, TagConfig};

/// Extracts the set of belief tags whose keywords occur in a text.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    /// Rules with keywords pre-lowercased.
    rules: Vec<KeywordRule>,
    mode: MatchMode,
}

impl TagExtractor {
    /// Build from a keyword table.
    #[must_use]
    pub fn new(rules: &[KeywordRule], mode: MatchMode) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| KeywordRule::new(r.keyword.to_lowercase(), r.tag.clone()))
                .collect(),
            mode,
        }
    }

    /// Build from the `[tags]` config section.
    #[must_use]
    pub fn from_config(config: &TagConfig) -> Self {
        Self::new(&config.keywords, config.match_mode)
    }

    /// Matched tags, deduplicated, in table order.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        let mut tags: Vec<String> = Vec::new();
        for rule in &self.rules {
            if tags.iter().any(|t| *t == rule.tag) {
                continue;
            }
            if self.matches(&haystack, &rule.keyword) {
                tags.push(rule.tag.clone());
            }
        }
        tags
    }

    fn matches(&self, haystack: &str, keyword: &str) -> bool {
        match self.mode {
            MatchMode::Substring => haystack.contains(keyword),
            MatchMode::WordBoundary => haystack.match_indices(keyword).any(|(start, _)| {
                haystack[..start]
                    .chars()
                    .next_back()
                    .is_none_or(|c| !c.is_alphanumeric())
            }),
        }
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::from_config(&TagConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_default_keywords_case_insensitively() {
        let extractor = TagExtractor::default();
        assert_eq!(extractor.extract("I TRUST you"), vec!["loyal_collaboration"]);
        assert_eq!(
            extractor.extract("Purpose and Discipline build a Legacy"),
            vec!["legacy_creation", "discipline", "shared_purpose"]
        );
    }

    #[test]
    fn no_keywords_yields_empty() {
        assert!(TagExtractor::default().extract("What's the weather?").is_empty());
        assert!(TagExtractor::default().extract("").is_empty());
    }

    #[test]
    fn repeated_keyword_yields_one_tag() {
        let tags = TagExtractor::default().extract("trust, trust and more trust");
        assert_eq!(tags, vec!["loyal_collaboration"]);
    }

    #[test]
    fn rules_sharing_a_tag_are_deduplicated() {
        let rules = vec![
            KeywordRule::new("loyal", "loyal_collaboration"),
            KeywordRule::new("trust", "loyal_collaboration"),
        ];
        let extractor = TagExtractor::new(&rules, MatchMode::Substring);
        assert_eq!(extractor.extract("loyal and trusted"), vec!["loyal_collaboration"]);
    }

    #[test]
    fn substring_mode_matches_inside_words() {
        let tags = TagExtractor::default().extract("pure distrust");
        assert_eq!(tags, vec!["loyal_collaboration"]);
    }

    #[test]
    fn word_boundary_mode_requires_word_start() {
        let config = TagConfig {
            match_mode: MatchMode::WordBoundary,
            ..TagConfig::default()
        };
        let extractor = TagExtractor::from_config(&config);
        assert!(extractor.extract("pure distrust").is_empty());
        assert_eq!(extractor.extract("I trusted them"), vec!["loyal_collaboration"]);
        assert_eq!(extractor.extract("(trust)"), vec!["loyal_collaboration"]);
        // A later occurrence at a word start still counts.
        assert_eq!(extractor.extract("distrust, then trust"), vec!["loyal_collaboration"]);
    }

    #[test]
    fn mixed_case_keywords_in_table_still_match() {
        let rules = vec![KeywordRule::new("Honor", "integrity")];
        let extractor = TagExtractor::new(&rules, MatchMode::Substring);
        assert_eq!(extractor.extract("with honor"), vec!["integrity"]);
    }
}
