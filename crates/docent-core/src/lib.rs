//! # Docent Core
//!
//! Retrieval logic for docent: text normalization, overlapping chunking,
//! a TF-IDF lexical index, the query-time retriever, and the ingestion
//! pipeline that ties them together.
//!
//! This crate contains no tokio, sqlx, network, or filesystem
//! dependencies. Format-specific extraction that needs native code (PDF)
//! is plugged in through the [`extract::TextExtractor`] trait.
//!
//! ```text
//! bytes ──▶ extract ──▶ normalize ──▶ chunk ──▶ LexicalIndex ──▶ Retriever
//! ```

pub mod analyzer;
pub mod chunk;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod normalize;
pub mod retriever;

pub use error::{Error, Result};
