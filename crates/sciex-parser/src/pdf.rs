//! PDF document handle using pdf-extract
//!
//! Renders each page to plain text. The file is read once on open; the
//! handle owns the bytes and releases them when dropped, whichever way the
//! caller leaves its scope.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{PageSource, ParserError, Result};

/// An opened PDF document
pub struct PdfDocument {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl PdfDocument {
    /// Open the PDF at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_bytes(path, bytes)
    }

    /// Wrap bytes that were already read, keeping `path` for diagnostics
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.into();
        if bytes.is_empty() {
            return Err(ParserError::EmptyFile(path.display().to_string()));
        }

        Ok(Self { path, bytes })
    }

    /// Path the document was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the raw document in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl PageSource for PdfDocument {
    fn page_texts(&self) -> Result<Vec<String>> {
        // pdf-extract can panic on malformed input instead of returning an error
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.bytes)
        }));

        match result {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(ParserError::PdfError(e.to_string())),
            Err(_) => Err(ParserError::PdfError(format!(
                "PDF parser panicked on malformed document: {}",
                self.path.display()
            ))),
        }
    }
}

impl Drop for PdfDocument {
    fn drop(&mut self) {
        debug!("Closed PDF document: {}", self.path.display());
    }
}
