mod config;
mod error;
mod hf;
mod provider;
mod result;


pub use config::{TokenizerConfig, TokenizerRegistry, builtin_configs};
pub use error::TokenizerError;
pub use hf::{HfLoader, HfTokenizer};
pub use provider::TokenizerProvider;
pub use result::{Encoding, TokenizationResult};

use std::sync::Arc;

/// Byte range of a token in the text it was encoded from
pub type Offset = (usize, usize);

/// Core capability every tokenizer handle must provide
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids, without model-specific special tokens
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decode a single token id back into its string fragment
    fn decode(&self, id: u32) -> Result<String, TokenizerError>;

    /// Per-token byte spans aligned with `encode`, if the backend reports them
    fn offsets(&self, _text: &str) -> Option<Vec<Offset>> {
        None
    }

    /// Encode and collect offsets in one call
    ///
    /// Backends that produce both from a single pass should override this.
    fn encode_with_offsets(
        &self,
        text: &str,
    ) -> Result<(Vec<u32>, Option<Vec<Offset>>), TokenizerError> {
        let ids = self.encode(text)?;
        Ok((ids, self.offsets(text)))
    }

    /// Number of tokens `text` encodes to
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }
}

/// Produces ready-to-use tokenizer handles from a configuration
///
/// Loading may block (disk or network); the provider runs it on the
/// blocking thread pool.
pub trait TokenizerLoader: Send + Sync {
    fn load(&self, config: &TokenizerConfig) -> Result<Arc<dyn Tokenizer>, TokenizerError>;
}
