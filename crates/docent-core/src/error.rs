//! Error taxonomy for the retrieval core.
//!
//! Every fallible core operation returns [`Error`]. Ingestion surfaces
//! these to the caller without retaining partial state; retrieval queries
//! never fail.

use thiserror::Error;

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid chunking or pipeline parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The declared document format is neither PDF nor plain text.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The format-specific extractor failed, or produced too little text.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// No non-blank chunks were left to index.
    #[error("no indexable content after filtering blank chunks")]
    EmptyCorpus,
}
