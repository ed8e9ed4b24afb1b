//! Layered configuration
//!
//! Sources are merged in order, later ones winning:
//! 1. `Settings::default()`
//! 2. an optional TOML file
//! 3. `CHUNKWISE_*` environment variables, `__` separating nested keys
//!    (e.g. `CHUNKWISE_CHUNKING__MAX_TOKENS=128`)

use crate::chunker::{
    ChunkError, ChunkOptions, DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP, Strategy,
};
use crate::tokenizer::{TokenizerConfig, TokenizerError, TokenizerRegistry, builtin_configs};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CHUNKWISE_";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("Invalid chunking settings: {0}")]
    Chunking(#[from] ChunkError),

    #[error(transparent)]
    Tokenizers(#[from] TokenizerError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    /// Directory searched for `<model>/tokenizer.json` before the hub
    pub tokenizer_dir: Option<PathBuf>,
    /// Tokenizer configuration table
    pub tokenizers: Vec<TokenizerConfig>,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub strategy: Strategy,
    pub max_tokens: usize,
    pub overlap: usize,
    /// Tokenizer id for exact counts; estimates are used when unset
    pub tokenizer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `CHUNKWISE_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chunking: ChunkingSettings::default(),
            tokenizer_dir: None,
            tokenizers: builtin_configs(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Hybrid,
            max_tokens: DEFAULT_MAX_TOKENS,
            overlap: DEFAULT_OVERLAP,
            tokenizer: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl ChunkingSettings {
    pub fn options(&self) -> ChunkOptions {
        ChunkOptions::new(self.max_tokens, self.overlap)
    }
}

impl Settings {
    /// Load from defaults, `path` (if given) and the environment, then
    /// validate
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = Self::extract(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge every layer without validating
    ///
    /// For callers that apply further overrides and call `validate` once
    /// the final values are known.
    pub fn extract(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::extract_from(Self::figment(path))
    }

    /// The merged provider stack: defaults, `path`, environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = path {
            debug!(path = %path.display(), "Merging configuration file");
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract settings from an assembled figment without validating
    pub fn extract_from(figment: Figment) -> Result<Self, SettingsError> {
        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Extract and validate settings from an assembled figment
    pub fn from_figment(figment: Figment) -> Result<Self, SettingsError> {
        let settings = Self::extract_from(figment)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.chunking.options().validate()?;
        let registry = self.registry()?;

        if let Some(id) = &self.chunking.tokenizer {
            if registry.get(id).is_none() {
                return Err(TokenizerError::UnknownTokenizer(id.clone()).into());
            }
        }
        Ok(())
    }

    /// Freeze the tokenizer table
    pub fn registry(&self) -> Result<TokenizerRegistry, TokenizerError> {
        TokenizerRegistry::new(self.tokenizers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<Settings, SettingsError> {
        Settings::from_figment(
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.strategy, Strategy::Hybrid);
        assert_eq!(settings.chunking.options(), ChunkOptions::default());
        assert_eq!(settings.registry().unwrap().configs().len(), builtin_configs().len());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let settings = from_toml(
            r#"
            [chunking]
            strategy = "tokens"
            max_tokens = 128
            overlap = 16
            tokenizer = "minilm"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(settings.chunking.strategy, Strategy::Tokens);
        assert_eq!(settings.chunking.options(), ChunkOptions::new(128, 16));
        assert_eq!(settings.chunking.tokenizer.as_deref(), Some("minilm"));
        assert_eq!(settings.logging.level, "debug");
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_custom_tokenizer_table() {
        let settings = from_toml(
            r#"
            [chunking]
            tokenizer = "local"

            [[tokenizers]]
            id = "local"
            name = "Local"
            model = "my-org/local-model"
            context_window = 1024
            description = "In-house model"
            "#,
        )
        .unwrap();

        let registry = settings.registry().unwrap();
        assert_eq!(registry.configs().len(), 1);
        assert_eq!(registry.get("local").unwrap().context_window, 1024);
    }

    #[test]
    fn test_overlap_must_be_below_max_tokens() {
        let result = from_toml("[chunking]\nmax_tokens = 10\noverlap = 10\n");
        assert!(matches!(
            result,
            Err(SettingsError::Chunking(ChunkError::OverlapTooLarge { .. }))
        ));
    }

    #[test]
    fn test_later_overrides_fix_invalid_layer() {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::string("[chunking]\noverlap = 300\n"));

        // Invalid on its own: overlap above the default max_tokens
        assert!(Settings::from_figment(figment.clone()).is_err());

        let mut settings = Settings::extract_from(figment).unwrap();
        assert_eq!(settings.chunking.overlap, 300);
        settings.chunking.max_tokens = 512;
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunking.options(), ChunkOptions::new(512, 300));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = from_toml("[chunking]\nstrategy = \"words\"\n");
        assert!(matches!(result, Err(SettingsError::Extract(_))));
    }

    #[test]
    fn test_unknown_tokenizer_rejected() {
        let result = from_toml("[chunking]\ntokenizer = \"nope\"\n");
        assert!(matches!(
            result,
            Err(SettingsError::Tokenizers(TokenizerError::UnknownTokenizer(_)))
        ));
    }
}
