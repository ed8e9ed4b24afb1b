//! Word-ratio token estimates used when no tokenizer accompanies a call

/// Assumed mean number of tokens per whitespace-delimited word
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Number of non-empty whitespace-delimited words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated token count, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    (word_count(text) as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Unrounded estimate, used when packing sentences
pub(crate) fn estimate_tokens_fractional(text: &str) -> f64 {
    word_count(text) as f64 * TOKENS_PER_WORD
}

/// Words that fit a token budget; never zero so windows always advance
pub(crate) fn words_per_window(max_tokens: usize) -> usize {
    ((max_tokens as f64 / TOKENS_PER_WORD).floor() as usize).max(1)
}

#[cfg(test)]
mod estimate_tests {
    use super::*;

    #[test]
    fn test_word_count_ignores_extra_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("  one\ttwo\n\nthree "), 3);
    }

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("Hi."), 2);
        assert_eq!(estimate_tokens("one two three"), 4);
    }

    #[test]
    fn test_words_per_window() {
        assert_eq!(words_per_window(4), 3);
        assert_eq!(words_per_window(100), 76);
        assert_eq!(words_per_window(1), 1);
        assert_eq!(words_per_window(0), 1);
    }
}
