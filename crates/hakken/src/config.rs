//! # Recognizer Configuration

use hakken_index::TitleWeights;
use serde::{Deserialize, Serialize};

/// How a winner is chosen when several anime share a normalized title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The most reliable title kind wins (a romaji title beats a synonym).
    #[default]
    HighestScore,
    /// The least reliable title kind wins. Kept for compatibility with
    /// libraries tuned against that ordering.
    LowestScore,
}

/// Configuration for the recognizer.
///
/// Deserializable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Policy for resolving title collisions
    pub tie_break: TieBreak,
    /// Per-title-kind scores used when the index is built
    pub weights: TitleWeights,
}

impl RecognizerConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tie-break policy.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the title-kind scores.
    #[must_use]
    pub fn with_weights(mut self, weights: TitleWeights) -> Self {
        self.weights = weights;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_highest_score() {
        let config = RecognizerConfig::new();
        assert_eq!(config.tie_break, TieBreak::HighestScore);
        assert_eq!(config.weights, TitleWeights::default());
    }

    #[test]
    fn builder_overrides() {
        let config = RecognizerConfig::new()
            .with_tie_break(TieBreak::LowestScore)
            .with_weights(TitleWeights {
                synonym: 0.1,
                ..TitleWeights::default()
            });
        assert_eq!(config.tie_break, TieBreak::LowestScore);
        assert_eq!(config.weights.synonym, 0.1);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: RecognizerConfig =
            serde_json::from_str(r#"{ "tie_break": "lowest_score", "weights": { "english": 0.95 } }"#)
                .unwrap();
        assert_eq!(config.tie_break, TieBreak::LowestScore);
        assert_eq!(config.weights.english, 0.95);
        assert_eq!(config.weights.primary, 1.0);
    }

    #[test]
    fn empty_json_is_default() {
        let config: RecognizerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RecognizerConfig::default());
    }
}
