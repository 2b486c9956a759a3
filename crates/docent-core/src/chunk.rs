//! Fixed-size overlapping text chunker.
//!
//! Splits normalized document text into windows of at most `chunk_size`
//! characters, each starting `chunk_size - overlap` characters after the
//! previous one. Sizes and offsets are counted in Unicode scalar values,
//! never bytes, so multi-byte text is never split mid-character.
//!
//! # Algorithm
//!
//! 1. Normalize the input (idempotent for already-normalized text).
//! 2. If the text fits in one window, return it as the only chunk.
//! 3. Otherwise emit `[start, start + chunk_size)` clipped to the text,
//!    advance `start` by the stride, and stop once `start` passes the end
//!    of the text. Trailing windows may be shorter than `chunk_size`.
//!
//! # Example
//!
//! ```rust
//! use docent_core::chunk::ChunkConfig;
//!
//! let config = ChunkConfig::new(4, 1).unwrap();
//! let chunks = config.chunk("abcdefghij");
//! assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
//! ```

use std::ops::Range;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::normalize::normalize;

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 900;
/// Default overlap between consecutive windows in characters.
pub const DEFAULT_OVERLAP: usize = 150;

/// Validated chunking parameters.
///
/// Invariant: `chunk_size > 0` and `overlap < chunk_size`, so the cursor
/// always advances by at least one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawChunkConfig")]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

#[derive(Deserialize)]
struct RawChunkConfig {
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_overlap")]
    overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

impl TryFrom<RawChunkConfig> for ChunkConfig {
    type Error = Error;

    fn try_from(raw: RawChunkConfig) -> Result<Self> {
        ChunkConfig::new(raw.chunk_size, raw.overlap)
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// Validate and build chunking parameters.
    ///
    /// Fails with [`Error::Configuration`] when `chunk_size == 0` or
    /// `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be > 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the start offsets of consecutive chunks.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Character ranges of each window over a text of `char_len` characters.
    ///
    /// Always returns at least one range; for an empty text it is `0..0`.
    pub fn spans(&self, char_len: usize) -> Vec<Range<usize>> {
        if char_len <= self.chunk_size {
            return vec![0..char_len];
        }

        let mut spans = Vec::with_capacity(char_len / self.stride() + 1);
        let mut start = 0;
        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            spans.push(start..end);
            start += self.stride();
        }
        spans
    }

    /// Normalize `text` and split it into overlapping windows.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = normalize(text);

        // Byte offset of every char boundary, including the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        self.spans(char_len)
            .into_iter()
            .map(|span| text[boundaries[span.start]..boundaries[span.end]].to_string())
            .collect()
    }
}

/// Split `text` into windows of `chunk_size` characters overlapping by
/// `overlap` characters.
///
/// Fails with [`Error::Configuration`] instead of looping when the
/// parameters cannot make progress.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(ChunkConfig::new(chunk_size, overlap)?.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello,\n\n world!", 900, 150).unwrap();
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let text = sample(900);
        let chunks = chunk_text(&text, 900, 150).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_empty_text_single_empty_chunk() {
        let chunks = chunk_text("", 900, 150).unwrap();
        assert_eq!(chunks, vec![String::new()]);
    }

    #[test]
    fn test_default_stride_on_2000_chars() {
        let config = ChunkConfig::default();
        let spans = config.spans(2000);
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 750, 1500]);
        assert_eq!(spans.last().unwrap().end, 2000);

        let text = sample(2000);
        let chunks = config.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 900);
        assert_eq!(chunks[1].chars().count(), 900);
        assert_eq!(chunks[2].chars().count(), 500);
        assert_eq!(chunks[0], text[0..900]);
        assert_eq!(chunks[1], text[750..1650]);
        assert_eq!(chunks[2], text[1500..2000]);
    }

    #[test]
    fn test_windows_continue_until_start_passes_end() {
        // 1650 = 750 + 900: the second window already reaches the end, but
        // the cursor is still inside the text.
        let starts: Vec<usize> = ChunkConfig::default()
            .spans(1650)
            .iter()
            .map(|s| s.start)
            .collect();
        assert_eq!(starts, vec![0, 750, 1500]);

        let chunks = chunk_text(&"abcdefghij".repeat(5), 10, 2).unwrap();
        assert_eq!(chunks.len(), 7);
        assert_eq!(chunks[6], "ij");
    }

    #[test]
    fn test_consecutive_chunks_overlap_exactly() {
        let config = ChunkConfig::new(100, 30).unwrap();
        let spans = config.spans(1234);
        for pair in spans.windows(2) {
            assert_eq!(pair[1].start - pair[0].start, 70);
            if pair[0].len() == 100 {
                assert_eq!(pair[0].end - pair[1].start, 30);
            }
        }
    }

    #[test]
    fn test_spans_cover_text_without_gaps() {
        let config = ChunkConfig::new(64, 16).unwrap();
        for len in [65, 100, 113, 500, 1000] {
            let spans = config.spans(len);
            assert_eq!(spans[0].start, 0);
            assert_eq!(spans.last().unwrap().end, len);
            for pair in spans.windows(2) {
                assert!(pair[1].start <= pair[0].end, "gap at {:?}", pair);
                assert!(pair[1].start > pair[0].start, "cursor stalled");
            }
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let err = chunk_text("some text", 100, 150).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        let err = chunk_text("some text", 100, 100).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            ChunkConfig::new(0, 0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_overlap_one_below_size_advances_by_one() {
        let chunks = chunk_text("abcdefgh", 5, 4).unwrap();
        assert_eq!(
            chunks,
            vec!["abcde", "bcdef", "cdefg", "defgh", "efgh", "fgh", "gh", "h"]
        );
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        let text = "héllo wörld ünïcödé";
        let chunks = chunk_text(text, 8, 2).unwrap();
        for c in &chunks {
            assert!(c.chars().count() <= 8);
        }
        assert!(chunks[0].starts_with("héllo"));
        assert!(chunks.iter().any(|c| c == "ünïcödé"));
        assert!(chunks.last().unwrap().ends_with('é'));
    }

    #[test]
    fn test_input_is_normalized_before_chunking() {
        let chunks = chunk_text("a\r\n\r\nb\t\tc", 900, 150).unwrap();
        assert_eq!(chunks, vec!["a b c".to_string()]);
    }
}
