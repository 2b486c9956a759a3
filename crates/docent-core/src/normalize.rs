//! Whitespace normalization.
//!
//! Extracted text (especially from PDFs) is full of line breaks, tabs and
//! runs of spaces. [`normalize`] folds all of it into a canonical single-line
//! form so chunk boundaries and offsets are stable.

/// Collapse every run of whitespace into one space and trim both ends.
///
/// Carriage returns count as whitespace, so the output never contains
/// `'\r'` and never contains two consecutive spaces. Total for any input;
/// the empty string maps to itself.
///
/// ```rust
/// use docent_core::normalize::normalize;
///
/// assert_eq!(normalize("  Hello\r\n\tworld  "), "Hello world");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_mixed_whitespace() {
        assert_eq!(normalize("a \t\n  b\r\rc"), "a b c");
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(normalize("\n\n  padded \t"), "padded");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \r\n\t "), "");
    }

    #[test]
    fn test_no_carriage_returns_or_double_spaces() {
        let out = normalize("line one\r\nline two\r\n\r\n   line three");
        assert!(!out.contains('\r'));
        assert!(!out.contains("  "));
        assert_eq!(out, "line one line two line three");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "plain",
            "  leading",
            "trailing  ",
            "multi\n\nparagraph\r\ntext\twith   gaps",
            "unicode\u{00a0}nbsp and\u{2003}em space",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_unicode_whitespace_collapsed() {
        assert_eq!(normalize("a\u{00a0}\u{2003}b"), "a b");
    }
}
