use serde::Serialize;
use std::fmt;

/// How well a chunk uses its token budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quality {
    Excellent,
    Good,
    /// Chunk stops mid-sentence
    Warning,
    Low,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::Excellent => "Excellent",
            Quality::Good => "Good",
            Quality::Warning => "Warning",
            Quality::Low => "Low",
        };
        f.pad(label)
    }
}

/// Size and quality statistics for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    /// Non-empty whitespace-delimited words
    pub word_count: usize,
    /// Characters in the raw chunk text
    pub char_count: usize,
    /// Runs of terminal punctuation
    pub sentence_count: usize,
    /// Real or estimated token count
    pub token_count: usize,
    /// True when `token_count` comes from the word-ratio estimate
    pub estimated: bool,
    /// Percentage of `max_tokens` used, rounded
    pub utilization: u32,
    pub quality: Quality,
    /// Overlap carried in from the previous chunk (fixed-token only)
    pub overlap_tokens: usize,
}
