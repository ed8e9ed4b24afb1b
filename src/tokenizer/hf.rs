use super::{Offset, Tokenizer, TokenizerConfig, TokenizerError, TokenizerLoader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Tokenizer handle backed by a Hugging Face `tokenizer.json`
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    pub fn new(inner: tokenizers::Tokenizer) -> Self {
        Self { inner }
    }

    fn encode_raw(&self, text: &str) -> Result<tokenizers::Encoding, TokenizerError> {
        self.inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        Ok(self.encode_raw(text)?.get_ids().to_vec())
    }

    fn decode(&self, id: u32) -> Result<String, TokenizerError> {
        self.inner
            .decode(&[id], false)
            .map_err(|e| TokenizerError::Decode(e.to_string()))
    }

    fn offsets(&self, text: &str) -> Option<Vec<Offset>> {
        self.encode_raw(text)
            .ok()
            .map(|encoding| encoding.get_offsets().to_vec())
    }

    fn encode_with_offsets(
        &self,
        text: &str,
    ) -> Result<(Vec<u32>, Option<Vec<Offset>>), TokenizerError> {
        let encoding = self.encode_raw(text)?;
        Ok((
            encoding.get_ids().to_vec(),
            Some(encoding.get_offsets().to_vec()),
        ))
    }

    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode_raw(text)?.len())
    }
}

/// Loads Hugging Face tokenizers from a local directory or the hub
///
/// With a local directory set, `<dir>/<model>/tokenizer.json` is used when it
/// exists; anything else is fetched from the hub.
#[derive(Debug, Clone, Default)]
pub struct HfLoader {
    local_dir: Option<PathBuf>,
}

impl HfLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer tokenizer files found under `dir`
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    fn local_file(&self, model: &str) -> Option<PathBuf> {
        let path = self
            .local_dir
            .as_ref()?
            .join(model)
            .join("tokenizer.json");
        path.is_file().then_some(path)
    }
}

impl TokenizerLoader for HfLoader {
    fn load(&self, config: &TokenizerConfig) -> Result<Arc<dyn Tokenizer>, TokenizerError> {
        let load_failed = |e: tokenizers::Error| TokenizerError::LoadFailed {
            id: config.id.clone(),
            reason: e.to_string(),
        };

        let inner = match self.local_file(&config.model) {
            Some(path) => {
                debug!(path = %path.display(), "Loading tokenizer from file");
                tokenizers::Tokenizer::from_file(&path).map_err(load_failed)?
            }
            None => {
                debug!(model = %config.model, "Fetching tokenizer from hub");
                tokenizers::Tokenizer::from_pretrained(&config.model, None).map_err(load_failed)?
            }
        };

        Ok(Arc::new(HfTokenizer::new(inner)))
    }
}
