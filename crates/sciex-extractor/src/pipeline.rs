//! PDF to context-record pipeline
//!
//! Text extraction followed by entity contextualization, run synchronously.

use std::path::Path;
use std::sync::Arc;

use sciex_core::{ContextRecord, Result};
use sciex_parser::PdfTextExtractor;

use crate::context::EntityContextualizer;
use crate::EntityRecognizer;

/// Extracts entities with context from PDF files
#[derive(Clone)]
pub struct ExtractionPipeline {
    extractor: PdfTextExtractor,
    contextualizer: EntityContextualizer,
}

impl ExtractionPipeline {
    /// Create a pipeline around a loaded recognizer
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, window_size: usize) -> Self {
        Self {
            extractor: PdfTextExtractor::new(),
            contextualizer: EntityContextualizer::new(recognizer).with_window_size(window_size),
        }
    }

    /// Extract the normalized text of a PDF
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        Ok(self.extractor.extract(path)?)
    }

    /// Extract context records from a PDF
    pub fn process_file(&self, path: &Path) -> Result<Vec<ContextRecord>> {
        let text = self.extract_text(path)?;
        self.process_text(&text)
    }

    /// Extract context records from already normalized text
    pub fn process_text(&self, text: &str) -> Result<Vec<ContextRecord>> {
        self.contextualizer.contextualize(text)
    }

    pub fn recognizer_name(&self) -> &str {
        self.contextualizer.recognizer().name()
    }
}
