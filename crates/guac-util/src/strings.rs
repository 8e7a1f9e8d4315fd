//! Bounded, UTF-8-safe string helpers.
//!
//! The original C helpers (`examples/original_source/src/common/guac_string.c`,
//! `src/libguac/string.c`) exist to avoid buffer overruns on fixed-size
//! `char[]` destinations (`guac_strlcpy`/`guac_strlcat`/`guac_strljoin`) and
//! to tokenize argument strings (`guac_count_occurrences`/`guac_split`).
//! Rust's owned `String` removes the overrun risk the `l`-prefixed
//! functions exist for, so this module keeps only what still matters for a
//! protocol implementation: splitting on a delimiter, counting occurrences,
//! joining with a delimiter, and truncating a `String` to a byte budget
//! without cutting a multi-byte codepoint in half (the one safety property
//! `guac_strlcpy`'s truncation did *not* provide, since it truncates at a
//! raw byte offset).

/// Counts occurrences of `needle` in `haystack`.
#[must_use]
pub fn count_occurrences(haystack: &str, needle: char) -> usize {
    haystack.chars().filter(|&c| c == needle).count()
}

/// Splits `s` on `delim`, mirroring `guac_split`'s tokenization (including
/// producing an empty token for adjacent delimiters or a leading/trailing
/// delimiter).
#[must_use]
pub fn split(s: &str, delim: char) -> Vec<String> {
    s.split(delim).map(str::to_string).collect()
}

/// Joins `elements` with `delim`, mirroring `guac_strljoin`.
#[must_use]
pub fn join(elements: &[&str], delim: &str) -> String {
    elements.join(delim)
}

/// Truncates `s` to at most `max_bytes` bytes without splitting a
/// multi-byte UTF-8 codepoint.
#[must_use]
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_occurrences() {
        assert_eq!(count_occurrences("a,b,,c", ','), 3);
        assert_eq!(count_occurrences("none", ','), 0);
    }

    #[test]
    fn splits_like_guac_split_including_empty_tokens() {
        assert_eq!(split("a,b,,c", ','), vec!["a", "b", "", "c"]);
        assert_eq!(split("", ','), vec![""]);
    }

    #[test]
    fn joins_with_delimiter() {
        assert_eq!(join(&["a", "b", "c"], ","), "a,b,c");
        assert_eq!(join(&[], ","), "");
    }

    #[test]
    fn truncation_never_splits_a_codepoint() {
        let s = "a\u{72AC}b";
        assert_eq!(truncate_utf8_safe(s, 0), "");
        assert_eq!(truncate_utf8_safe(s, 1), "a");
        assert_eq!(truncate_utf8_safe(s, 2), "a");
        assert_eq!(truncate_utf8_safe(s, 3), "a\u{72AC}");
        assert_eq!(truncate_utf8_safe(s, 100), s);
    }
}
