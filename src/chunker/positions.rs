use serde::Serialize;

/// Prefixes tokenizers put on sub-word and word-boundary pieces
const MARKER_PREFIXES: [&str; 3] = ["##", "Ġ", "▁"];

/// Approximate location of a decoded token in the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    /// Token string as decoded
    pub token: String,
    /// Byte offset of the match (start)
    pub start: usize,
    /// Byte offset of the match (end)
    pub end: usize,
}

/// Strip marker prefixes and turn inline space markers back into spaces
pub fn clean_token(token: &str) -> String {
    let stripped = MARKER_PREFIXES
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
        .unwrap_or(token);

    stripped.replace(['Ġ', '▁'], " ")
}

/// Best-effort recovery of byte spans for decoded tokens
///
/// Walks the text with a cursor. Each cleaned token is searched for from the
/// cursor, exactly first and then ignoring case; a hit moves the cursor past
/// the match. A miss records a span of the token's length at the cursor and
/// moves on, so drift never aborts the walk. Spans never go backwards and
/// always lie on character boundaries inside `text`.
pub fn map_tokens_to_char_positions<S: AsRef<str>>(text: &str, tokens: &[S]) -> Vec<TokenSpan> {
    let mut cursor = 0;
    let mut spans = Vec::with_capacity(tokens.len());

    for token in tokens {
        let token = token.as_ref();
        let clean = clean_token(token);

        let (start, end) = if clean.is_empty() {
            // Special tokens and bare markers take no room
            (cursor, cursor)
        } else {
            let rest = &text[cursor..];
            let found = rest
                .find(clean.as_str())
                .map(|at| (at, at + clean.len()))
                .or_else(|| find_ignore_case(rest, &clean));

            match found {
                Some((at, until)) => (cursor + at, cursor + until),
                None => (cursor, snap_to_boundary(text, cursor + clean.len())),
            }
        };

        cursor = end;
        spans.push(TokenSpan {
            token: token.to_string(),
            start,
            end,
        });
    }

    spans
}

/// Byte range of the first case-insensitive occurrence of `needle`
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();

    haystack.char_indices().find_map(|(start, _)| {
        lowercase_prefix_len(&haystack[start..], &needle).map(|len| (start, start + len))
    })
}

/// Byte length of the prefix of `haystack` that lowercases to `needle`
fn lowercase_prefix_len(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut wanted = needle.iter().peekable();

    for (idx, c) in haystack.char_indices() {
        for lower in c.to_lowercase() {
            match wanted.next() {
                Some(&w) if w == lower => {}
                _ => return None,
            }
        }
        if wanted.peek().is_none() {
            return Some(idx + c.len_utf8());
        }
    }

    None
}

/// Clamp to the text and move forward onto a character boundary
fn snap_to_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod position_tests {
    use super::*;

    fn ranges(spans: &[TokenSpan]) -> Vec<(usize, usize)> {
        spans.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_clean_token_markers() {
        assert_eq!(clean_token("##ing"), "ing");
        assert_eq!(clean_token("Ġworld"), "world");
        assert_eq!(clean_token("▁hello"), "hello");
        assert_eq!(clean_token("aĠb"), "a b");
        assert_eq!(clean_token("plain"), "plain");
        assert_eq!(clean_token("##"), "");
    }

    #[test]
    fn test_exact_matches() {
        let spans = map_tokens_to_char_positions("hello world", &["hello", "Ġworld"]);
        assert_eq!(ranges(&spans), vec![(0, 5), (6, 11)]);
        assert_eq!(spans[1].token, "Ġworld");
    }

    #[test]
    fn test_wordpiece_continuation() {
        let spans = map_tokens_to_char_positions("tokenizing text", &["token", "##izing", "text"]);
        assert_eq!(ranges(&spans), vec![(0, 5), (5, 10), (11, 15)]);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        // Uncased vocabularies lowercase everything
        let spans = map_tokens_to_char_positions("Hello World", &["hello", "world"]);
        assert_eq!(ranges(&spans), vec![(0, 5), (6, 11)]);
    }

    #[test]
    fn test_empty_token_is_zero_width() {
        let spans = map_tokens_to_char_positions("ab", &["a", "", "b"]);
        assert_eq!(ranges(&spans), vec![(0, 1), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_unmatched_token_advances_cursor() {
        let spans = map_tokens_to_char_positions("abc def", &["[UNK]", "def"]);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, 5);
        // The miss overshoots, so "def" is only partly visible afterwards
        assert_eq!(ranges(&spans)[1], (5, 7));
    }

    #[test]
    fn test_unmatched_token_clamped_to_text() {
        let spans = map_tokens_to_char_positions("hi", &["something-long", "x"]);
        assert_eq!(ranges(&spans), vec![(0, 2), (2, 2)]);
    }

    #[test]
    fn test_spans_are_monotonic() {
        let text = "Der Fluß fließt. ÜBER alles!";
        let tokens = ["der", "fluß", "zzz", "fließt", ".", "über", "alles", "!"];
        let spans = map_tokens_to_char_positions(text, &tokens);

        let mut last_end = 0;
        for span in &spans {
            assert!(span.start >= last_end || span.start == span.end);
            assert!(span.start <= span.end);
            assert!(text.is_char_boundary(span.start));
            assert!(text.is_char_boundary(span.end));
            last_end = span.end;
        }
    }

    #[test]
    fn test_multibyte_case_insensitive_range() {
        let text = "ÜBER";
        let spans = map_tokens_to_char_positions(text, &["über"]);
        assert_eq!(ranges(&spans), vec![(0, text.len())]);
    }
}
