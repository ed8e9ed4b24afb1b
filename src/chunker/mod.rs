mod error;
mod estimate;
mod positions;
mod splitter;
mod strategy;


pub use error::ChunkError;
pub use estimate::{TOKENS_PER_WORD, estimate_tokens, word_count};
pub use positions::{TokenSpan, clean_token, map_tokens_to_char_positions};
pub use splitter::{Chunk, segment, sentence_ranges};
pub use strategy::{ChunkOptions, Strategy};

/// Default token budget per chunk
pub const DEFAULT_MAX_TOKENS: usize = 256;

/// Default overlap between consecutive fixed-token chunks
pub const DEFAULT_OVERLAP: usize = 20;
