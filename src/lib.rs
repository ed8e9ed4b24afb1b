// Public API exports
pub mod chunker;
pub mod logging;
pub mod metadata;
pub mod settings;
pub mod tokenizer;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use chunker::{
    Chunk, ChunkError, ChunkOptions, Strategy, TokenSpan, estimate_tokens,
    map_tokens_to_char_positions, segment,
};

pub use metadata::{ChunkMetadata, Quality, score_chunk, score_chunks};

pub use tokenizer::{
    Encoding, HfLoader, HfTokenizer, TokenizationResult, Tokenizer, TokenizerConfig,
    TokenizerError, TokenizerLoader, TokenizerProvider, TokenizerRegistry,
};

pub use settings::{Settings, SettingsError};
