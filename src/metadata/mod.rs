mod scorer;
mod types;


pub use scorer::{score_chunk, score_chunks};
pub use types::{ChunkMetadata, Quality};

/// Utilization ratio above which a chunk is Excellent (exclusive)
pub const EXCELLENT_MIN_RATIO: f64 = 0.70;

/// Utilization ratio below which a chunk is still Excellent (exclusive)
pub const EXCELLENT_MAX_RATIO: f64 = 0.95;

/// Utilization ratio under which a chunk is Low
pub const LOW_RATIO: f64 = 0.50;
