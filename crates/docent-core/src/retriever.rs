//! Query-time ranking over a [`LexicalIndex`].
//!
//! A [`Retriever`] exclusively owns its index. Sessions hold one retriever
//! and replace it wholesale when a new document is uploaded; there is no
//! shared or incremental state.

use serde::Serialize;

use crate::index::LexicalIndex;

/// A chunk ranked against a query. Produced fresh per query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// Position of the chunk among the indexed (non-blank) chunks.
    pub ordinal: usize,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
    pub text: String,
}

/// Ranks chunks of one document against free-text queries.
///
/// An empty retriever (no document, or nothing indexable) answers every
/// query with an empty result; retrieval is optional context.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    index: Option<LexicalIndex>,
}

impl Retriever {
    pub fn new(index: LexicalIndex) -> Self {
        Self { index: Some(index) }
    }

    /// A retriever with no document behind it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&LexicalIndex> {
        self.index.as_ref()
    }

    /// Number of chunks that can be returned.
    pub fn chunk_count(&self) -> usize {
        self.index.as_ref().map_or(0, LexicalIndex::len)
    }

    /// Return the `top_k` best chunks for `text`, best first.
    ///
    /// The result has `min(top_k, chunk_count)` entries. Equal scores keep
    /// ascending ordinal order.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<RankedResult> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        if top_k == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(usize, f64)> =
            index.similarities(text).into_iter().enumerate().collect();

        // `sort_by` is stable, so ties stay in ordinal order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .map(|(ordinal, score)| RankedResult {
                ordinal,
                score,
                text: index.chunks()[ordinal].clone(),
            })
            .collect()
    }
}
