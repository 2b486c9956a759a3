//! PDF text extraction backed by `pdf-extract`.
//!
//! Plugged into the core pipeline via
//! [`IngestPipeline::with_pdf_extractor`](docent_core::ingest::IngestPipeline::with_pdf_extractor).
//! Extraction runs on the in-memory bytes; nothing is written to disk.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use docent_core::extract::TextExtractor;
use docent_core::{Error, Result};

thread_local! {
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, catching any panic without the default hook printing it.
///
/// Only panics on the calling thread are silenced; other threads keep the
/// previously installed hook.
fn catch_quietly<T>(f: impl FnOnce() -> T) -> std::thread::Result<T> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !SILENCED.with(Cell::get) {
                previous(info);
            }
        }));
    });

    SILENCED.with(|s| s.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    SILENCED.with(|s| s.set(false));
    outcome
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs.
        let outcome = catch_quietly(|| pdf_extract::extract_text_from_mem(bytes));

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::Extraction(format!("PDF extraction failed: {}", e))),
            Err(_) => Err(Error::Extraction(
                "PDF extraction failed: malformed document".to_string(),
            )),
        }
    }
}
