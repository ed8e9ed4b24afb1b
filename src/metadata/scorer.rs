use super::{ChunkMetadata, EXCELLENT_MAX_RATIO, EXCELLENT_MIN_RATIO, LOW_RATIO, Quality};
use crate::chunker::{ChunkOptions, Strategy, estimate_tokens, word_count};
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TERMINAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("terminal pattern is valid"));

/// Compute size and quality statistics for one chunk
///
/// Never fails: without a working tokenizer the token count is estimated
/// from the word count and flagged as such.
pub fn score_chunk(
    chunk: &str,
    strategy: Strategy,
    options: &ChunkOptions,
    tokenizer: Option<&dyn Tokenizer>,
) -> ChunkMetadata {
    let word_count = word_count(chunk);
    let (token_count, estimated) = count_tokens(chunk, tokenizer);

    let ratio = token_count as f64 / options.max_tokens.max(1) as f64;
    let utilization = (ratio * 100.0).round() as u32;

    ChunkMetadata {
        word_count,
        char_count: chunk.chars().count(),
        sentence_count: TERMINAL_RUN.find_iter(chunk).count(),
        token_count,
        estimated,
        utilization,
        quality: classify(chunk, strategy, ratio),
        overlap_tokens: if strategy == Strategy::Tokens {
            options.overlap
        } else {
            0
        },
    }
}

/// Score every chunk independently, in parallel
///
/// The result is keyed by each chunk's position in `chunks`.
pub fn score_chunks<S>(
    chunks: &[S],
    strategy: Strategy,
    options: &ChunkOptions,
    tokenizer: Option<&dyn Tokenizer>,
) -> BTreeMap<usize, ChunkMetadata>
where
    S: AsRef<str> + Sync,
{
    let scored: BTreeMap<usize, ChunkMetadata> = chunks
        .par_iter()
        .enumerate()
        .map(|(index, chunk)| {
            (
                index,
                score_chunk(chunk.as_ref(), strategy, options, tokenizer),
            )
        })
        .collect();

    debug!(chunks = scored.len(), strategy = %strategy, "Scored chunks");
    scored
}

fn count_tokens(chunk: &str, tokenizer: Option<&dyn Tokenizer>) -> (usize, bool) {
    if let Some(tokenizer) = tokenizer {
        match tokenizer.count(chunk) {
            Ok(count) => return (count, false),
            Err(e) => warn!(error = %e, "Tokenizer failed, estimating chunk size"),
        }
    }
    (estimate_tokens(chunk), true)
}

fn classify(chunk: &str, strategy: Strategy, ratio: f64) -> Quality {
    // Fixed-token chunks are not expected to end on a sentence boundary
    if strategy != Strategy::Tokens && !ends_on_sentence(chunk) {
        return Quality::Warning;
    }

    if ratio > EXCELLENT_MIN_RATIO && ratio < EXCELLENT_MAX_RATIO {
        Quality::Excellent
    } else if ratio < LOW_RATIO {
        Quality::Low
    } else {
        Quality::Good
    }
}

fn ends_on_sentence(chunk: &str) -> bool {
    chunk.trim_end().ends_with(['.', '!', '?'])
}
