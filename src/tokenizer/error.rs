use thiserror::Error;

/// Errors raised by tokenizer handles and the provider adapter.
///
/// Cloneable so a single load outcome can be handed to every caller waiting
/// on the same identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("Unknown tokenizer: {0}")]
    UnknownTokenizer(String),

    #[error("Failed to load tokenizer {id}: {reason}")]
    LoadFailed { id: String, reason: String },

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Invalid tokenizer configuration: {0}")]
    InvalidConfig(String),
}
