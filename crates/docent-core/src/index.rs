//! TF-IDF lexical index over a chunk collection.
//!
//! # Weighting
//!
//! For `n` indexed chunks and a term `t` appearing in `df(t)` of them:
//!
//! ```text
//! idf(t)       = ln((1 + n) / (1 + df(t))) + 1
//! w(t, chunk)  = count(t, chunk) × idf(t)
//! ```
//!
//! Every chunk vector is L2-normalised at build time, and query vectors are
//! normalised the same way, so cosine similarity reduces to a sparse dot
//! product. All weights are non-negative, which keeps scores in `[0, 1]`.
//!
//! The index is immutable: vocabulary, IDF table and chunk vectors are fixed
//! by [`LexicalIndex::build`]. A new document means a new index.

use std::collections::{BTreeMap, HashMap};

use crate::analyzer::Analyzer;
use crate::error::{Error, Result};

/// Sparse vector: `(term_id, weight)` pairs sorted by `term_id`.
type SparseVector = Vec<(usize, f64)>;

#[derive(Debug, Clone)]
pub struct LexicalIndex {
    analyzer: Analyzer,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    chunks: Vec<String>,
    vectors: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Build an index over `chunks`.
    ///
    /// Blank and whitespace-only chunks are dropped first; the surviving
    /// chunks, in their original order, define the ordinal space used by
    /// every [`RankedResult`](crate::retriever::RankedResult).
    ///
    /// Fails with [`Error::EmptyCorpus`] if nothing survives the filter.
    pub fn build<I, S>(chunks: I, analyzer: Analyzer) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks: Vec<String> = chunks
            .into_iter()
            .map(Into::into)
            .filter(|c| !c.trim().is_empty())
            .collect();

        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        let mut counts: Vec<BTreeMap<usize, usize>> = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let mut tf: BTreeMap<usize, usize> = BTreeMap::new();
            for term in analyzer.terms(chunk) {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next_id);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                *tf.entry(id).or_insert(0) += 1;
            }
            for &id in tf.keys() {
                doc_freq[id] += 1;
            }
            counts.push(tf);
        }

        let n = chunks.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = counts
            .into_iter()
            .map(|tf| weigh(&tf, &idf))
            .collect();

        Ok(Self {
            analyzer,
            vocabulary,
            idf,
            chunks,
            vectors,
        })
    }

    /// Number of indexed (non-blank) chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always false; an index cannot be built over an empty corpus.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    /// Text of the chunk at `ordinal`, if any.
    pub fn chunk(&self, ordinal: usize) -> Option<&str> {
        self.chunks.get(ordinal).map(String::as_str)
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Whether `term` (already analyzed) is part of the vocabulary.
    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Cosine similarity of `query` against every chunk, in ordinal order.
    ///
    /// Out-of-vocabulary query terms are ignored. A query with no known
    /// terms scores `0.0` everywhere.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let query_vec = self.query_vector(query);
        if query_vec.is_empty() {
            return vec![0.0; self.chunks.len()];
        }
        self.vectors
            .iter()
            .map(|v| sparse_dot(&query_vec, v).clamp(0.0, 1.0))
            .collect()
    }

    fn query_vector(&self, query: &str) -> SparseVector {
        let mut tf: BTreeMap<usize, usize> = BTreeMap::new();
        for term in self.analyzer.terms(query) {
            if let Some(&id) = self.vocabulary.get(&term) {
                *tf.entry(id).or_insert(0) += 1;
            }
        }
        weigh(&tf, &self.idf)
    }
}

/// TF × IDF, then L2-normalise. Empty input yields an empty vector.
fn weigh(tf: &BTreeMap<usize, usize>, idf: &[f64]) -> SparseVector {
    let mut vec: SparseVector = tf
        .iter()
        .map(|(&id, &count)| (id, count as f64 * idf[id]))
        .collect();

    let norm = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > f64::EPSILON {
        for (_, w) in &mut vec {
            *w /= norm;
        }
    } else {
        vec.clear();
    }
    vec
}

/// Dot product of two sparse vectors sorted by term id.
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
