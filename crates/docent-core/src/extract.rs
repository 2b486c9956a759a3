//! Format detection and the text-extraction seam.
//!
//! The core decodes plain text itself. PDF parsing needs a native
//! dependency, so the application supplies it through [`TextExtractor`].

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Upload formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Detect the format from a file name's extension.
    pub fn from_filename(name: &str) -> Result<Self> {
        match name.rsplit_once('.') {
            Some((_, ext)) => ext.parse(),
            None => Err(Error::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => MIME_PDF,
            DocumentFormat::PlainText => MIME_TEXT,
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = Error;

    /// Accepts a MIME type (`application/pdf`, `text/plain`), a bare
    /// extension (`pdf`, `txt`), or a file name ending in one.
    fn from_str(declared: &str) -> Result<Self> {
        let lower = declared.trim().to_ascii_lowercase();
        match lower.as_str() {
            MIME_PDF | "pdf" | ".pdf" => Ok(DocumentFormat::Pdf),
            MIME_TEXT | "txt" | ".txt" | "text" => Ok(DocumentFormat::PlainText),
            _ if lower.ends_with(".pdf") => Ok(DocumentFormat::Pdf),
            _ if lower.ends_with(".txt") => Ok(DocumentFormat::PlainText),
            _ => Err(Error::UnsupportedFormat(declared.to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Turns raw document bytes into text.
///
/// Implementations must not panic on malformed input; they return
/// [`Error::Extraction`] instead.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// UTF-8 decoder that drops invalid byte sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut out = String::with_capacity(bytes.len());
        for piece in bytes.utf8_chunks() {
            out.push_str(piece.valid());
        }
        Ok(out)
    }
}

/// Placeholder used when no PDF backend is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPdfSupport;

impl TextExtractor for NoPdfSupport {
    fn extract(&self, _bytes: &[u8]) -> Result<String> {
        Err(Error::Extraction(
            "no PDF extractor configured".to_string(),
        ))
    }
}
