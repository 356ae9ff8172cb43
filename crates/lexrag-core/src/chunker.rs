//! Fixed-width character chunking.
//!
//! Whitespace runs are collapsed to a single space and the ends trimmed
//! before splitting. Slices are cut every `max_chars` characters with no
//! word-boundary awareness, so chunk boundaries are deterministic.

/// Collapse whitespace runs into single spaces and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into non-empty chunks of at most `max_chars` characters.
///
/// Empty or whitespace-only input yields an empty vector. A `max_chars` of
/// zero is treated as "no bound" and yields the whole normalized text.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let cleaned = normalize_whitespace(text);
    if cleaned.is_empty() {
        return Vec::new();
    }
    if max_chars == 0 || cleaned.chars().count() <= max_chars {
        return vec![cleaned];
    }
    let chars: Vec<char> = cleaned.chars().collect();
    chars.chunks(max_chars).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(chunk("  a\n\tb  ", 512), vec!["a b".to_string()]);
    }

    #[test]
    fn long_text_is_split_with_remainder() {
        let parts = chunk("abcdefghij", 4);
        assert_eq!(parts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let parts = chunk("çğıöşü", 4);
        assert_eq!(parts, vec!["çğıö", "şü"]);
    }
}
