use super::TokenizerError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Static description of a tokenizer the provider knows how to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Unique lookup key (e.g., "minilm")
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Underlying Hugging Face model identifier
    pub model: String,
    /// Maximum number of tokens the downstream model accepts
    pub context_window: usize,
    /// Short description shown in listings
    pub description: String,
}

impl TokenizerConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        context_window: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            context_window,
            description: description.into(),
        }
    }
}

/// Embedding tokenizers available out of the box
pub fn builtin_configs() -> Vec<TokenizerConfig> {
    vec![
        TokenizerConfig::new(
            "bert-base",
            "BERT Base",
            "bert-base-uncased",
            512,
            "Original BERT - great for general embeddings",
        ),
        TokenizerConfig::new(
            "mpnet",
            "MPNet (all-mpnet-base-v2)",
            "sentence-transformers/all-mpnet-base-v2",
            384,
            "Excellent sentence embeddings, balanced performance",
        ),
        TokenizerConfig::new(
            "minilm",
            "MiniLM (all-MiniLM-L6-v2)",
            "sentence-transformers/all-MiniLM-L6-v2",
            256,
            "Fast and lightweight, good for most tasks",
        ),
        TokenizerConfig::new(
            "e5-small",
            "E5 Small",
            "intfloat/e5-small-v2",
            512,
            "Microsoft E5 - strong multilingual support",
        ),
        TokenizerConfig::new(
            "gte-small",
            "GTE Small",
            "thenlper/gte-small",
            512,
            "Alibaba GTE - high quality general embeddings",
        ),
        TokenizerConfig::new(
            "bge-small",
            "BGE Small",
            "BAAI/bge-small-en-v1.5",
            512,
            "BAAI BGE - popular for RAG applications",
        ),
        TokenizerConfig::new(
            "nomic-embed",
            "Nomic Embed",
            "nomic-ai/nomic-embed-text-v1",
            8192,
            "Nomic - modern model with large context window",
        ),
        TokenizerConfig::new(
            "instructor-base",
            "Instructor Base",
            "hkunlp/instructor-base",
            512,
            "Instructor - task-specific embeddings via instructions",
        ),
    ]
}

/// Immutable lookup table of tokenizer configurations
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct TokenizerRegistry {
    configs: Vec<TokenizerConfig>,
}

impl TokenizerRegistry {
    /// Build a registry, rejecting duplicate ids and empty context windows
    pub fn new(configs: Vec<TokenizerConfig>) -> Result<Self, TokenizerError> {
        let mut seen = HashSet::new();

        for config in &configs {
            if config.id.is_empty() {
                return Err(TokenizerError::InvalidConfig(
                    "Tokenizer id must not be empty".to_string(),
                ));
            }
            if !seen.insert(config.id.as_str()) {
                return Err(TokenizerError::InvalidConfig(format!(
                    "Duplicate tokenizer id: {}",
                    config.id
                )));
            }
            if config.context_window == 0 {
                return Err(TokenizerError::InvalidConfig(format!(
                    "Context window must be positive for {}",
                    config.id
                )));
            }
        }

        Ok(Self { configs })
    }

    /// Look up a configuration by id
    pub fn get(&self, id: &str) -> Option<&TokenizerConfig> {
        self.configs.iter().find(|c| c.id == id)
    }

    /// All configurations in declaration order
    pub fn configs(&self) -> &[TokenizerConfig] {
        &self.configs
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self {
            configs: builtin_configs(),
        }
    }
}
