use super::{ChunkError, DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How text is cut into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fixed-size token windows with overlap
    Tokens,
    /// Blank-line separated paragraphs
    Paragraph,
    /// Punctuation-terminated sentences
    Sentence,
    /// Whole sentences packed up to the token limit
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Tokens,
        Strategy::Paragraph,
        Strategy::Sentence,
        Strategy::Hybrid,
    ];

    /// Identifier accepted by `FromStr`
    pub fn id(self) -> &'static str {
        match self {
            Strategy::Tokens => "tokens",
            Strategy::Paragraph => "paragraph",
            Strategy::Sentence => "sentence",
            Strategy::Hybrid => "hybrid",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Tokens => "Fixed Tokens",
            Strategy::Paragraph => "Paragraphs",
            Strategy::Sentence => "Sentences",
            Strategy::Hybrid => "Hybrid",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Strategy::Tokens => "Split by token count",
            Strategy::Paragraph => "Split by paragraphs",
            Strategy::Sentence => "Split by sentences",
            Strategy::Hybrid => "Sentences with token limit",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Strategy {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChunkError::UnknownStrategy(s.to_string()))
    }
}

/// Size limits shared by segmentation and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Token budget per chunk
    pub max_tokens: usize,
    /// Tokens shared between consecutive fixed-token chunks
    pub overlap: usize,
}

impl ChunkOptions {
    pub fn new(max_tokens: usize, overlap: usize) -> Self {
        Self {
            max_tokens,
            overlap,
        }
    }

    /// Reject budgets that cannot produce a forward-moving window
    ///
    /// `segment` tolerates these (it emits a single window), so callers that
    /// want the mistake surfaced validate first.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_tokens == 0 {
            return Err(ChunkError::ZeroMaxTokens);
        }
        if self.overlap >= self.max_tokens {
            return Err(ChunkError::OverlapTooLarge {
                overlap: self.overlap,
                max_tokens: self.max_tokens,
            });
        }
        Ok(())
    }
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP)
    }
}

#[cfg(test)]
mod strategy_tests {
    use super::*;

    #[test]
    fn test_parse_strategy_ids() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.id().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("Hybrid".parse::<Strategy>().unwrap(), Strategy::Hybrid);
        assert_eq!(" tokens ".parse::<Strategy>().unwrap(), Strategy::Tokens);
    }

    #[test]
    fn test_unknown_strategy_is_an_error() {
        assert_eq!(
            "words".parse::<Strategy>(),
            Err(ChunkError::UnknownStrategy("words".to_string()))
        );
    }

    #[test]
    fn test_validate_options() {
        assert!(ChunkOptions::new(100, 10).validate().is_ok());
        assert_eq!(ChunkOptions::new(0, 0).validate(), Err(ChunkError::ZeroMaxTokens));
        assert_eq!(
            ChunkOptions::new(4, 4).validate(),
            Err(ChunkError::OverlapTooLarge {
                overlap: 4,
                max_tokens: 4
            })
        );
    }

    #[test]
    fn test_serde_ids_match_display() {
        let json = serde_json::to_string(&Strategy::Paragraph).unwrap();
        assert_eq!(json, "\"paragraph\"");
        assert_eq!(Strategy::Paragraph.to_string(), "paragraph");
    }
}
