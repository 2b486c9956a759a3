//! Document ingestion pipeline.
//!
//! Orchestrates one upload: raw bytes → extract → normalize → chunk →
//! [`LexicalIndex`] → [`Retriever`]. This is the only place document bytes
//! enter the core. Storage and network I/O stay with the caller.
//!
//! Any failure aborts the whole call; no partially built index escapes.

use crate::analyzer::Analyzer;
use crate::chunk::ChunkConfig;
use crate::error::{Error, Result};
use crate::extract::{DocumentFormat, NoPdfSupport, PlainTextExtractor, TextExtractor};
use crate::index::LexicalIndex;
use crate::normalize::normalize;
use crate::retriever::Retriever;

/// Normalized texts shorter than this are treated as failed extractions.
pub const DEFAULT_MIN_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub chunking: ChunkConfig,
    pub analyzer: Analyzer,
    pub min_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            analyzer: Analyzer::default(),
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

/// Result of a successful ingestion.
#[derive(Debug)]
pub struct IngestedDocument {
    /// Full normalized text, for persistence by the caller.
    pub text: String,
    /// Number of chunks produced before blank filtering.
    pub chunk_count: usize,
    pub retriever: Retriever,
}

/// Upload pipeline with pluggable format-specific extractors.
pub struct IngestPipeline {
    config: PipelineConfig,
    pdf: Box<dyn TextExtractor>,
    text: Box<dyn TextExtractor>,
}

impl IngestPipeline {
    /// Pipeline that only understands plain text; PDF uploads fail with
    /// [`Error::Extraction`] until [`with_pdf_extractor`](Self::with_pdf_extractor) is used.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            pdf: Box::new(NoPdfSupport),
            text: Box::new(PlainTextExtractor),
        }
    }

    pub fn with_pdf_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.pdf = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest a document whose format is given as a MIME type, extension or
    /// file name. Unknown declarations fail with [`Error::UnsupportedFormat`].
    pub fn ingest_declared(
        &self,
        bytes: &[u8],
        declared_format: &str,
    ) -> Result<IngestedDocument> {
        let format: DocumentFormat = declared_format.parse()?;
        self.ingest(bytes, format)
    }

    pub fn ingest(&self, bytes: &[u8], format: DocumentFormat) -> Result<IngestedDocument> {
        let extractor = match format {
            DocumentFormat::Pdf => &self.pdf,
            DocumentFormat::PlainText => &self.text,
        };

        let raw = extractor.extract(bytes)?;
        let text = normalize(&raw);
        let char_len = text.chars().count();
        if char_len < self.config.min_chars {
            return Err(Error::Extraction(format!(
                "document text too short ({} chars, need at least {})",
                char_len, self.config.min_chars
            )));
        }

        let chunks = self.config.chunking.chunk(&text);
        let chunk_count = chunks.len();
        let index = LexicalIndex::build(chunks, self.config.analyzer)?;

        tracing::info!(
            format = %format,
            chars = char_len,
            chunks = chunk_count,
            vocabulary = index.vocabulary_size(),
            "document indexed"
        );

        Ok(IngestedDocument {
            text,
            chunk_count,
            retriever: Retriever::new(index),
        })
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
