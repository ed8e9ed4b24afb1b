//! Deterministic tokenizer doubles shared by the unit tests

use crate::tokenizer::{Offset, Tokenizer, TokenizerConfig, TokenizerError, TokenizerLoader};
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

static WORD_PIECE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\S+").unwrap());

#[derive(Default)]
struct Vocab {
    ids: HashMap<String, u32>,
    pieces: Vec<String>,
}

/// One token per word, each carrying the whitespace that precedes it
///
/// "a b" encodes to the pieces "a" and " b", so joining decoded tokens
/// reproduces the input.
#[derive(Default)]
pub struct WordTokenizer {
    vocab: Mutex<Vocab>,
    with_offsets: bool,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offsets() -> Self {
        Self {
            with_offsets: true,
            ..Self::default()
        }
    }
}

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let mut vocab = self.vocab.lock().unwrap();
        let ids = WORD_PIECE
            .find_iter(text)
            .map(|m| {
                let piece = m.as_str().to_string();
                if let Some(&id) = vocab.ids.get(&piece) {
                    return id;
                }
                let id = vocab.pieces.len() as u32;
                vocab.pieces.push(piece.clone());
                vocab.ids.insert(piece, id);
                id
            })
            .collect();
        Ok(ids)
    }

    fn decode(&self, id: u32) -> Result<String, TokenizerError> {
        let vocab = self.vocab.lock().unwrap();
        vocab
            .pieces
            .get(id as usize)
            .cloned()
            .ok_or_else(|| TokenizerError::Decode(format!("unknown id {}", id)))
    }

    fn offsets(&self, text: &str) -> Option<Vec<Offset>> {
        if !self.with_offsets {
            return None;
        }
        Some(
            WORD_PIECE
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
        )
    }
}

/// Tokenizer whose every call fails
pub struct BrokenTokenizer;

impl Tokenizer for BrokenTokenizer {
    fn encode(&self, _text: &str) -> Result<Vec<u32>, TokenizerError> {
        Err(TokenizerError::Encode("backend unavailable".to_string()))
    }

    fn decode(&self, id: u32) -> Result<String, TokenizerError> {
        Err(TokenizerError::Decode(format!("backend unavailable for {}", id)))
    }
}

/// Loader that hands out `WordTokenizer`s and counts how often it ran
#[derive(Clone, Default)]
pub struct CountingLoader {
    pub calls: Arc<AtomicUsize>,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            delay,
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenizerLoader for CountingLoader {
    fn load(&self, config: &TokenizerConfig) -> Result<Arc<dyn Tokenizer>, TokenizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);

        if self.fail {
            return Err(TokenizerError::LoadFailed {
                id: config.id.clone(),
                reason: "model download failed".to_string(),
            });
        }

        Ok(Arc::new(WordTokenizer::with_offsets()))
    }
}

/// Chunk texts, for compact assertions
pub fn texts(chunks: &[crate::chunker::Chunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}
