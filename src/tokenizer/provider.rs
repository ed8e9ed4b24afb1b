use super::{
    Encoding, TokenizationResult, Tokenizer, TokenizerConfig, TokenizerError, TokenizerLoader,
    TokenizerRegistry,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

type LoadOutcome = Result<Arc<dyn Tokenizer>, TokenizerError>;
type PendingLoad = Shared<BoxFuture<'static, LoadOutcome>>;

/// Memoizing front for tokenizer loading
///
/// Owns two tables keyed by tokenizer id: loaded handles, and loads that are
/// still running. At most one load runs per id; concurrent callers share its
/// outcome. Cloning the provider shares both tables.
#[derive(Clone)]
pub struct TokenizerProvider {
    registry: Arc<TokenizerRegistry>,
    loader: Arc<dyn TokenizerLoader>,
    cache: Arc<DashMap<String, Arc<dyn Tokenizer>>>,
    loading: Arc<DashMap<String, PendingLoad>>,
}

impl TokenizerProvider {
    pub fn new(registry: TokenizerRegistry, loader: impl TokenizerLoader + 'static) -> Self {
        Self {
            registry: Arc::new(registry),
            loader: Arc::new(loader),
            cache: Arc::new(DashMap::new()),
            loading: Arc::new(DashMap::new()),
        }
    }

    /// Configuration for `id`, if the registry knows it
    pub fn config_for(&self, id: &str) -> Option<&TokenizerConfig> {
        self.registry.get(id)
    }

    /// Every configured tokenizer
    pub fn configs(&self) -> &[TokenizerConfig] {
        self.registry.configs()
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.contains_key(id)
    }

    /// Return a ready handle for `id`, loading it on first use
    ///
    /// A cached handle is returned without suspending. If a load for `id` is
    /// already running, the caller waits on it instead of starting another.
    /// Unknown ids fail before anything is loaded or recorded.
    pub async fn load(&self, id: &str) -> LoadOutcome {
        if let Some(handle) = self.cached(id) {
            return Ok(handle);
        }

        let config = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| TokenizerError::UnknownTokenizer(id.to_string()))?;

        let pending = match self.loading.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                debug!(tokenizer = id, "Joining in-flight load");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // A load may have finished between the cache check and here
                if let Some(handle) = self.cached(id) {
                    return Ok(handle);
                }
                let pending = self.spawn_load(config);
                entry.insert(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Tokenize `text` with the tokenizer registered as `id`
    pub async fn tokenize(&self, text: &str, id: &str) -> Result<TokenizationResult, TokenizerError> {
        let tokenizer = self.load(id).await?;
        let config = self
            .registry
            .get(id)
            .ok_or_else(|| TokenizerError::UnknownTokenizer(id.to_string()))?;

        let encoding = Encoding::encode(tokenizer.as_ref(), text)?;
        let result = TokenizationResult::new(text, config, encoding);

        if !result.is_within_context {
            debug!(
                tokenizer = id,
                tokens = result.token_count(),
                overflow = result.overflow,
                "Text exceeds context window"
            );
        }

        Ok(result)
    }

    /// Token count only, under the same load rules as `tokenize`
    pub async fn count_tokens(&self, text: &str, id: &str) -> Result<usize, TokenizerError> {
        let tokenizer = self.load(id).await?;
        if text.is_empty() {
            return Ok(0);
        }
        tokenizer.count(text)
    }

    /// Drop every cached handle
    ///
    /// Loads already running still complete and cache their result.
    pub fn clear_cache(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        debug!(dropped, "Cleared tokenizer cache");
    }

    fn cached(&self, id: &str) -> Option<Arc<dyn Tokenizer>> {
        self.cache.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Start the load on its own task so it finishes even if every caller
    /// stops waiting
    fn spawn_load(&self, config: TokenizerConfig) -> PendingLoad {
        let loader = Arc::clone(&self.loader);
        let cache = Arc::clone(&self.cache);
        let loading = Arc::clone(&self.loading);
        let id = config.id.clone();
        let task_id = id.clone();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let model = config.model.clone();

            let outcome = tokio::task::spawn_blocking(move || loader.load(&config))
                .await
                .unwrap_or_else(|e| {
                    Err(TokenizerError::LoadFailed {
                        id: task_id.clone(),
                        reason: e.to_string(),
                    })
                });

            match &outcome {
                Ok(handle) => {
                    cache.insert(task_id.clone(), Arc::clone(handle));
                    info!(
                        tokenizer = %task_id,
                        model = %model,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Tokenizer loaded"
                    );
                }
                Err(e) => warn!(tokenizer = %task_id, error = %e, "Tokenizer load failed"),
            }

            // Cache before clearing the marker so a racing caller finds one of them
            loading.remove(&task_id);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(TokenizerError::LoadFailed {
                    id,
                    reason: e.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }
}
