use super::estimate::{estimate_tokens_fractional, words_per_window};
use super::positions::map_tokens_to_char_positions;
use super::{ChunkOptions, Strategy};
use crate::tokenizer::{Encoding, Tokenizer, TokenizerError};
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::{debug, warn};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph pattern is valid"));

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence pattern is valid"));

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("word pattern is valid"));

/// A contiguous piece of the input, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// The text content of this chunk
    pub text: String,
    /// Byte offset in the source text (start)
    pub start_offset: usize,
    /// Byte offset in the source text (end)
    pub end_offset: usize,
    /// First token index, for chunks cut from a real token sequence
    pub token_start: Option<usize>,
    /// One past the last token index
    pub token_end: Option<usize>,
    /// Tokens shared with the previous chunk
    pub overlap_tokens: usize,
}

impl Chunk {
    /// Chunk covering `range` of `source` verbatim
    fn from_range(source: &str, range: Range<usize>) -> Self {
        Self {
            text: source[range.clone()].to_string(),
            start_offset: range.start,
            end_offset: range.end,
            token_start: None,
            token_end: None,
            overlap_tokens: 0,
        }
    }

    /// Number of tokens, when the chunk was cut from a token sequence
    pub fn token_len(&self) -> Option<usize> {
        Some(self.token_end? - self.token_start?)
    }
}

/// Split `text` into chunks with the given strategy
///
/// Empty input yields no chunks. The token-aware strategies use `tokenizer`
/// when one is supplied and fall back to the word-ratio estimate otherwise,
/// or when the tokenizer fails.
pub fn segment(
    text: &str,
    strategy: Strategy,
    options: &ChunkOptions,
    tokenizer: Option<&dyn Tokenizer>,
) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let chunks = match strategy {
        Strategy::Paragraph => split_paragraphs(text),
        Strategy::Sentence => sentence_ranges(text)
            .into_iter()
            .map(|range| Chunk::from_range(text, range))
            .collect(),
        Strategy::Tokens => match tokenizer {
            Some(tokenizer) => token_windows(text, options, tokenizer).unwrap_or_else(|e| {
                warn!(error = %e, "Tokenizer failed, falling back to word windows");
                word_windows(text, options)
            }),
            None => word_windows(text, options),
        },
        Strategy::Hybrid => pack_sentences(text, options, tokenizer),
    };

    debug!(
        strategy = %strategy,
        max_tokens = options.max_tokens,
        overlap = options.overlap,
        exact = tokenizer.is_some(),
        chunks = chunks.len(),
        "Segmented text"
    );

    chunks
}

/// Paragraphs separated by two or more newlines, blank ones dropped
fn split_paragraphs(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0;

    let ends = PARAGRAPH_BREAK
        .find_iter(text)
        .map(|brk| (brk.start(), brk.end()))
        .chain(std::iter::once((text.len(), text.len())));

    for (end, next_start) in ends {
        if !text[start..end].trim().is_empty() {
            chunks.push(Chunk::from_range(text, start..end));
        }
        start = next_start;
    }

    chunks
}

/// Byte ranges of punctuation-terminated sentences
///
/// Text without any terminal punctuation is a single sentence. Trailing text
/// after the last terminal mark is not part of any sentence.
pub fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let ranges: Vec<_> = SENTENCE.find_iter(text).map(|m| m.range()).collect();
    if ranges.is_empty() {
        return vec![0..text.len()];
    }
    ranges
}

/// Sliding windows over real tokens
fn token_windows(
    text: &str,
    options: &ChunkOptions,
    tokenizer: &dyn Tokenizer,
) -> Result<Vec<Chunk>, TokenizerError> {
    let encoding = Encoding::encode(tokenizer, text)?;
    if encoding.is_empty() {
        return Ok(Vec::new());
    }

    let spans: Vec<(usize, usize)> = match &encoding.offsets {
        Some(offsets) => offsets.clone(),
        None => map_tokens_to_char_positions(text, &encoding.tokens)
            .into_iter()
            .map(|span| (span.start, span.end))
            .collect(),
    };

    let total = encoding.len();
    let width = options.max_tokens.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + width).min(total);
        let start_offset = spans[start].0;

        chunks.push(Chunk {
            text: encoding.tokens[start..end].concat().trim().to_string(),
            start_offset,
            end_offset: spans[end - 1].1.max(start_offset),
            token_start: Some(start),
            token_end: Some(end),
            overlap_tokens: if start > 0 { options.overlap } else { 0 },
        });

        // Stop at the last token, or when the stride would not be positive
        if end == total || options.overlap >= options.max_tokens {
            break;
        }
        start += width - options.overlap;
    }

    Ok(chunks)
}

/// Sliding windows over words, sized by the tokens-per-word estimate
///
/// The window holds fewer words than `max_tokens`, so an overlap that fits
/// the token budget may not fit the window. The stride is then one word and
/// consecutive windows share all but one word.
fn word_windows(text: &str, options: &ChunkOptions) -> Vec<Chunk> {
    let words: Vec<_> = WORD.find_iter(text).collect();
    let width = words_per_window(options.max_tokens);
    let stride = width.saturating_sub(options.overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut prev_end: usize = 0;

    while start < words.len() {
        let end = (start + width).min(words.len());
        let window = &words[start..end];

        chunks.push(Chunk {
            text: window
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            start_offset: window[0].start(),
            end_offset: window[window.len() - 1].end(),
            token_start: None,
            token_end: None,
            overlap_tokens: prev_end.saturating_sub(start),
        });

        if end == words.len() || options.overlap >= options.max_tokens {
            break;
        }
        prev_end = end;
        start += stride;
    }

    chunks
}

/// Greedily pack whole sentences up to the token budget
///
/// A sentence that would push the running count over `max_tokens` starts a
/// new chunk, unless the current chunk is still empty. Sentences are never
/// split and no overlap is applied.
fn pack_sentences(
    text: &str,
    options: &ChunkOptions,
    tokenizer: Option<&dyn Tokenizer>,
) -> Vec<Chunk> {
    let budget = options.max_tokens as f64;
    let mut counter = tokenizer;
    let mut chunks = Vec::new();
    let mut current: Vec<Range<usize>> = Vec::new();
    let mut current_tokens = 0.0;

    for range in sentence_ranges(text) {
        let sentence_tokens = measure(&text[range.clone()], &mut counter);

        // Check if adding this sentence would exceed the limit
        if current_tokens + sentence_tokens > budget && !current.is_empty() {
            chunks.push(join_sentences(text, &current));
            current.clear();
            current_tokens = 0.0;
        }

        current_tokens += sentence_tokens;
        current.push(range);
    }

    // Flush remaining sentences
    if !current.is_empty() {
        chunks.push(join_sentences(text, &current));
    }

    chunks
}

/// Token count of one sentence; a failing tokenizer is dropped for the rest
/// of the call
fn measure(sentence: &str, tokenizer: &mut Option<&dyn Tokenizer>) -> f64 {
    if let Some(t) = *tokenizer {
        match t.count(sentence) {
            Ok(count) => return count as f64,
            Err(e) => {
                warn!(error = %e, "Tokenizer failed, estimating sentence sizes");
                *tokenizer = None;
            }
        }
    }
    estimate_tokens_fractional(sentence)
}

fn join_sentences(text: &str, sentences: &[Range<usize>]) -> Chunk {
    let start_offset = sentences.first().map(|r| r.start).unwrap_or(0);
    let end_offset = sentences.last().map(|r| r.end).unwrap_or(0);

    Chunk {
        text: sentences.iter().map(|r| &text[r.clone()]).collect(),
        start_offset,
        end_offset,
        token_start: None,
        token_end: None,
        overlap_tokens: 0,
    }
}
