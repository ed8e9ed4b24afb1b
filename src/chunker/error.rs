use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("Unknown chunking strategy: {0}")]
    UnknownStrategy(String),

    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("Overlap ({overlap}) must be less than max_tokens ({max_tokens})")]
    OverlapTooLarge { overlap: usize, max_tokens: usize },
}
