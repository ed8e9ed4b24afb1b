use super::{Offset, Tokenizer, TokenizerConfig, TokenizerError};
use serde::Serialize;
use tracing::warn;

/// Token ids, their decoded strings and optional offsets for one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Encoding {
    pub token_ids: Vec<u32>,
    /// Decoded string of each id, same length as `token_ids`
    pub tokens: Vec<String>,
    /// Byte span of each token, same length as `token_ids` when present
    pub offsets: Option<Vec<Offset>>,
}

impl Encoding {
    /// Encode `text` and decode every id individually
    pub fn encode(tokenizer: &dyn Tokenizer, text: &str) -> Result<Self, TokenizerError> {
        let (token_ids, offsets) = tokenizer.encode_with_offsets(text)?;

        let tokens = token_ids
            .iter()
            .map(|&id| tokenizer.decode(id))
            .collect::<Result<Vec<_>, _>>()?;

        let offsets = match offsets {
            Some(offsets) if offsets.len() != token_ids.len() => {
                warn!(
                    ids = token_ids.len(),
                    offsets = offsets.len(),
                    "Discarding offsets that do not line up with token ids"
                );
                None
            }
            other => other,
        };

        Ok(Self {
            token_ids,
            tokens,
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.token_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty()
    }
}

/// Full tokenization of a text against a configured tokenizer
#[derive(Debug, Clone, Serialize)]
pub struct TokenizationResult {
    /// Original input text
    pub text: String,
    /// Tokenizer id used
    pub tokenizer_id: String,
    /// Hugging Face model behind the tokenizer
    pub model: String,
    /// Context window of the model
    pub context_window: usize,
    #[serde(flatten)]
    pub encoding: Encoding,
    /// Whether the text fits in the context window
    pub is_within_context: bool,
    /// Tokens beyond the context window
    pub overflow: usize,
}

impl TokenizationResult {
    pub fn new(text: impl Into<String>, config: &TokenizerConfig, encoding: Encoding) -> Self {
        let count = encoding.len();

        Self {
            text: text.into(),
            tokenizer_id: config.id.clone(),
            model: config.model.clone(),
            context_window: config.context_window,
            is_within_context: count <= config.context_window,
            overflow: count.saturating_sub(config.context_window),
            encoding,
        }
    }

    pub fn token_count(&self) -> usize {
        self.encoding.len()
    }

    pub fn token_ids(&self) -> &[u32] {
        &self.encoding.token_ids
    }

    pub fn tokens(&self) -> &[String] {
        &self.encoding.tokens
    }

    pub fn offsets(&self) -> Option<&[Offset]> {
        self.encoding.offsets.as_deref()
    }
}
