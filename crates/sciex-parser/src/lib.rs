//! SCIEX Parser - PDF text extraction
//!
//! Turns a PDF on disk into the single normalized string that entity
//! recognition runs over. Pages are read in order, each page's text is
//! trimmed, the pages are concatenated without separators, and two global
//! substitutions are applied (see [`normalize_text`]).

pub mod pdf;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use pdf::PdfDocument;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while extracting text from a PDF
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF parsing error
    #[error("PDF parsing error: {0}")]
    PdfError(String),

    /// File has no bytes to parse
    #[error("File is empty: {0}")]
    EmptyFile(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for sciex_core::SciexError {
    fn from(err: ParserError) -> Self {
        sciex_core::SciexError::Extraction(Box::new(err))
    }
}

// ============================================================================
// Page Sources
// ============================================================================

/// Anything that renders an ordered list of page texts
pub trait PageSource {
    /// Plain-text rendering of every page, in ascending page order
    fn page_texts(&self) -> Result<Vec<String>>;
}

impl PageSource for [String] {
    fn page_texts(&self) -> Result<Vec<String>> {
        Ok(self.to_vec())
    }
}

impl PageSource for Vec<String> {
    fn page_texts(&self) -> Result<Vec<String>> {
        Ok(self.clone())
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Apply the document-wide substitutions to concatenated page text.
///
/// Carriage returns become newlines, then every `"- "` is removed to rejoin
/// words hyphenated at a line wrap. The second rule does not know about real
/// hyphenated compounds, so `"anti- inflammatory"` and `"able- bodied"` are
/// both joined.
pub fn normalize_text(text: &str) -> String {
    text.replace('\r', "\n").replace("- ", "")
}

// ============================================================================
// Extractor
// ============================================================================

/// Extracts normalized text from PDF files
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the normalized text of every page of the PDF at `path`
    pub fn extract(&self, path: &Path) -> Result<String> {
        info!("Starting text extraction from: {}", path.display());

        // The document is dropped at the end of this expression on every path
        let result = PdfDocument::open(path).and_then(|doc| {
            debug!("Opened PDF document: {} ({} bytes)", doc.path().display(), doc.size());
            self.extract_from(&doc)
        });

        match result {
            Ok(text) => {
                info!("Successfully extracted {} characters", text.chars().count());
                Ok(text)
            }
            Err(e) => {
                error!("Failed to extract text: {}", e);
                Err(e)
            }
        }
    }

    /// Concatenate and normalize the pages of any page source
    pub fn extract_from<S: PageSource + ?Sized>(&self, source: &S) -> Result<String> {
        let pages = source.page_texts()?;
        let total_pages = pages.len();

        let mut text = String::new();
        for (index, page) in pages.iter().enumerate() {
            debug!("Processing page {} out of {}", index + 1, total_pages);
            text.push_str(page.trim());
        }

        Ok(normalize_text(&text))
    }
}

// ============================================================================
// Tests
// ============================================================================
