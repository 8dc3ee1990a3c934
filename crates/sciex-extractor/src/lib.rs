//! SCIEX Extractor - Entity recognition and contextualization
//!
//! Runs a named entity recognition model over normalized document text and
//! turns each recognized span into a [`ContextRecord`](sciex_core::ContextRecord)
//! carrying the span's char offsets and a readable context snippet.
//!
//! The model is a black box behind [`EntityRecognizer`]. It reports entity
//! spans and a sentence segmentation of the same text, both in byte offsets.

use sciex_core::Result;

/// A recognized entity span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    /// Surface text, equal to `text[start..end]` of the analyzed input
    pub text: String,
    pub label: String,
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    /// Index into [`Analysis::sentences`] of the sentence containing the span
    pub sentence: Option<usize>,
}

/// A sentence boundary pair in byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

/// Model output for one text
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Entities in the order the model found them
    pub entities: Vec<EntitySpan>,
    /// Sentences in document order; empty when segmentation is unavailable
    pub sentences: Vec<SentenceSpan>,
}

/// Trait for NER models
pub trait EntityRecognizer: Send + Sync {
    /// Model name used in logs
    fn name(&self) -> &str;

    /// Recognize entities and segment sentences in `text`
    fn analyze(&self, text: &str) -> Result<Analysis>;
}

pub mod context;
pub mod lexicon;
pub mod pipeline;
pub mod segment;

pub use context::{collapse_whitespace, CharIndex, ContextBounds, EntityContextualizer};
pub use lexicon::{LexiconModel, ModelArtifact};
pub use pipeline::ExtractionPipeline;
pub use segment::SentenceSegmenter;
