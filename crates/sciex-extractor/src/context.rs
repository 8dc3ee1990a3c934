//! Entity contextualization
//!
//! Each recognized entity is paired with a readable snippet: its enclosing
//! sentence when the model segmented one, otherwise a char window around
//! the entity clamped to the document. Records report char offsets.

use std::ops::Range;
use std::sync::Arc;

use tracing::{error, info};

use crate::{Analysis, EntityRecognizer, EntitySpan, SentenceSpan};
use sciex_core::{ContextRecord, Result, SciexError};

/// Default number of chars taken on each side of an entity without a sentence
pub const DEFAULT_WINDOW_SIZE: usize = 100;

// ============================================================================
// Char Offsets
// ============================================================================

/// Maps between byte offsets and char offsets of one text
#[derive(Debug, Clone)]
pub struct CharIndex {
    /// Byte offset of every char, followed by the text length
    boundaries: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Number of chars in the text
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Char offset of a byte offset that lies on a char boundary
    pub fn char_offset(&self, byte: usize) -> usize {
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }

    /// Byte offset of a char offset, clamped to the text length
    pub fn byte_offset(&self, char_offset: usize) -> usize {
        self.boundaries[char_offset.min(self.char_len())]
    }
}

// ============================================================================
// Context Bounds
// ============================================================================

/// Byte range of the text rendered as an entity's context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextBounds {
    /// The sentence enclosing the entity
    Sentence { start: usize, end: usize },
    /// A char window around the entity, clamped to the document
    Window { start: usize, end: usize },
}

impl ContextBounds {
    pub fn sentence(sentence: SentenceSpan) -> Self {
        Self::Sentence {
            start: sentence.start,
            end: sentence.end,
        }
    }

    /// `window` chars before the entity's first char through `window` chars after its last
    pub fn window(index: &CharIndex, entity_start: usize, entity_end: usize, window: usize) -> Self {
        let start_char = index.char_offset(entity_start).saturating_sub(window);
        let end_char = index
            .char_offset(entity_end)
            .saturating_add(window)
            .min(index.char_len());

        Self::Window {
            start: index.byte_offset(start_char),
            end: index.byte_offset(end_char),
        }
    }

    /// Sentence bounds when the entity has a sentence, window bounds otherwise
    pub fn resolve(
        index: &CharIndex,
        sentences: &[SentenceSpan],
        entity: &EntitySpan,
        window: usize,
    ) -> Self {
        match entity.sentence.and_then(|i| sentences.get(i)) {
            Some(sentence) => Self::sentence(*sentence),
            None => Self::window(index, entity.start, entity.end, window),
        }
    }

    pub fn range(&self) -> Range<usize> {
        match *self {
            Self::Sentence { start, end } | Self::Window { start, end } => start..end,
        }
    }

    pub fn is_sentence(&self) -> bool {
        matches!(self, Self::Sentence { .. })
    }

    /// Slice `text` at these bounds and collapse its whitespace
    pub fn render(&self, text: &str) -> String {
        text.get(self.range())
            .map(collapse_whitespace)
            .unwrap_or_default()
    }
}

/// Trim `text` and collapse every internal whitespace run, newlines included, to one space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Contextualizer
// ============================================================================

/// Runs a recognizer and derives a context record for each entity
#[derive(Clone)]
pub struct EntityContextualizer {
    recognizer: Arc<dyn EntityRecognizer>,
    window_size: usize,
}

impl EntityContextualizer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Set the fallback window size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn recognizer(&self) -> &Arc<dyn EntityRecognizer> {
        &self.recognizer
    }

    /// Recognize entities in `text` and return their context records in model order
    pub fn contextualize(&self, text: &str) -> Result<Vec<ContextRecord>> {
        info!("Run text through '{}' model", self.recognizer.name());
        let analysis = self.recognizer.analyze(text).map_err(|e| {
            error!("Error during entity extraction: {}", e);
            e
        })?;

        info!("Extracting entities");
        let records = self.records(text, &analysis)?;

        info!("Successfully extracted {} entities", records.len());
        Ok(records)
    }

    /// Build context records for an analysis of `text`
    pub fn records(&self, text: &str, analysis: &Analysis) -> Result<Vec<ContextRecord>> {
        let index = CharIndex::new(text);

        analysis
            .entities
            .iter()
            .map(|entity| {
                check_span(text, analysis, entity)?;
                let bounds =
                    ContextBounds::resolve(&index, &analysis.sentences, entity, self.window_size);

                Ok(ContextRecord {
                    text: entity.text.clone(),
                    start: index.char_offset(entity.start),
                    end: index.char_offset(entity.end),
                    context: bounds.render(text),
                })
            })
            .collect()
    }
}

/// Reject spans that would break the offset invariants of the output records
fn check_span(text: &str, analysis: &Analysis, entity: &EntitySpan) -> Result<()> {
    let in_text = entity.start < entity.end
        && text.get(entity.start..entity.end) == Some(entity.text.as_str());
    if !in_text {
        return Err(SciexError::Recognition(format!(
            "entity '{}' at {}..{} does not match the analyzed text",
            entity.text, entity.start, entity.end
        )));
    }

    if let Some(i) = entity.sentence {
        let valid = analysis
            .sentences
            .get(i)
            .is_some_and(|s| s.start <= s.end && text.get(s.start..s.end).is_some());
        if !valid {
            return Err(SciexError::Recognition(format!(
                "entity '{}' references unknown sentence {}",
                entity.text, i
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Returns a fixed analysis regardless of input
    struct FixedRecognizer(Analysis);

    impl EntityRecognizer for FixedRecognizer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn analyze(&self, _text: &str) -> Result<Analysis> {
            Ok(self.0.clone())
        }
    }

    struct FailingRecognizer;

    impl EntityRecognizer for FailingRecognizer {
        fn name(&self) -> &str {
            "failing"
        }

        fn analyze(&self, _text: &str) -> Result<Analysis> {
            Err(SciexError::Recognition("inference failed".to_string()))
        }
    }

    fn span(text: &str, needle: &str, sentence: Option<usize>) -> EntitySpan {
        let start = text.find(needle).unwrap();
        EntitySpan {
            text: needle.to_string(),
            label: "CHEMICAL".to_string(),
            start,
            end: start + needle.len(),
            sentence,
        }
    }

    fn contextualizer(analysis: Analysis) -> EntityContextualizer {
        EntityContextualizer::new(Arc::new(FixedRecognizer(analysis)))
    }

    /// Chars `start..end` of `text`
    fn char_slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_sentence_bounded_context() {
        let text = "Patients received 10mg of Aspirin daily.";
        let analysis = Analysis {
            entities: vec![span(text, "Aspirin", Some(0))],
            sentences: vec![SentenceSpan { start: 0, end: 40 }],
        };

        let records = contextualizer(analysis).contextualize(text).unwrap();
        assert_eq!(
            records,
            vec![ContextRecord {
                text: "Aspirin".to_string(),
                start: 26,
                end: 33,
                context: "Patients received 10mg of Aspirin daily.".to_string(),
            }]
        );
    }

    #[test]
    fn test_sentence_context_collapses_whitespace() {
        let text = "Intro.  The dose of\n  aspirin\twas low.  ";
        let analysis = Analysis {
            entities: vec![span(text, "aspirin", Some(1))],
            sentences: vec![
                SentenceSpan { start: 0, end: 6 },
                SentenceSpan { start: 8, end: 38 },
            ],
        };

        let records = contextualizer(analysis).contextualize(text).unwrap();
        assert_eq!(records[0].context, "The dose of aspirin was low.");
    }

    #[test]
    fn test_window_bounds_clamped_to_document() {
        let text = "short aspirin text";
        let index = CharIndex::new(text);
        let bounds = ContextBounds::window(&index, 6, 13, 100);

        assert_eq!(bounds, ContextBounds::Window { start: 0, end: text.len() });
        assert!(!bounds.is_sentence());
        assert_eq!(bounds.render(text), "short aspirin text");
    }

    #[test]
    fn test_window_bounds_interior() {
        let text = "abcdefghij ASPIRIN klmnopqrst";
        let index = CharIndex::new(text);
        let bounds = ContextBounds::window(&index, 11, 18, 3);

        assert_eq!(bounds.range(), 8..21);
        assert_eq!(bounds.render(text), "ij ASPIRIN kl");
    }

    #[test]
    fn test_window_counts_chars_not_bytes() {
        let text = "ααααα aspirin βββββ";
        let entity = span(text, "aspirin", None);
        let index = CharIndex::new(text);
        let bounds = ContextBounds::window(&index, entity.start, entity.end, 2);

        assert_eq!(bounds.render(text), "α aspirin β");
    }

    #[test]
    fn test_missing_sentence_falls_back_to_window() {
        let text = "Aspirin then more words";
        let analysis = Analysis {
            entities: vec![span(text, "Aspirin", None)],
            sentences: vec![SentenceSpan { start: 0, end: 23 }],
        };

        let records = contextualizer(analysis)
            .with_window_size(5)
            .contextualize(text)
            .unwrap();
        assert_eq!(records[0].context, "Aspirin then");
    }

    #[test]
    fn test_resolve_picks_variant() {
        let text = "One. Aspirin two.";
        let index = CharIndex::new(text);
        let sentences = vec![
            SentenceSpan { start: 0, end: 4 },
            SentenceSpan { start: 5, end: 17 },
        ];

        let with_sentence = span(text, "Aspirin", Some(1));
        assert_eq!(
            ContextBounds::resolve(&index, &sentences, &with_sentence, 100),
            ContextBounds::Sentence { start: 5, end: 17 }
        );

        let without_sentence = span(text, "Aspirin", None);
        assert_eq!(
            ContextBounds::resolve(&index, &sentences, &without_sentence, 100),
            ContextBounds::Window { start: 0, end: 17 }
        );
    }

    #[test]
    fn test_char_offsets_reported() {
        let text = "Über α-synuclein and aspirin.";
        let analysis = Analysis {
            entities: vec![span(text, "aspirin", None)],
            sentences: Vec::new(),
        };

        let records = contextualizer(analysis).contextualize(text).unwrap();
        let record = &records[0];
        assert_eq!(char_slice(text, record.start, record.end), "aspirin");
        assert_eq!((record.start, record.end), (21, 28));
    }

    #[test]
    fn test_zero_entities_is_empty_list() {
        let records = contextualizer(Analysis::default())
            .contextualize("No entities here.")
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_duplicates_and_order_preserved() {
        let text = "aspirin aspirin";
        let analysis = Analysis {
            entities: vec![
                EntitySpan {
                    text: "aspirin".to_string(),
                    label: "CHEMICAL".to_string(),
                    start: 8,
                    end: 15,
                    sentence: None,
                },
                span(text, "aspirin", None),
            ],
            sentences: Vec::new(),
        };

        let records = contextualizer(analysis).contextualize(text).unwrap();
        let starts: Vec<usize> = records.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![8, 0]);
    }

    #[test]
    fn test_recognition_error_propagates() {
        let contextualizer = EntityContextualizer::new(Arc::new(FailingRecognizer));
        let err = contextualizer.contextualize("text").unwrap_err();
        assert!(matches!(err, SciexError::Recognition(_)));
    }

    #[test]
    fn test_span_outside_text_rejected() {
        let analysis = Analysis {
            entities: vec![EntitySpan {
                text: "aspirin".to_string(),
                label: "CHEMICAL".to_string(),
                start: 10,
                end: 17,
                sentence: None,
            }],
            sentences: Vec::new(),
        };

        let err = contextualizer(analysis).contextualize("short").unwrap_err();
        assert!(matches!(err, SciexError::Recognition(_)));
    }

    #[test]
    fn test_unknown_sentence_rejected() {
        let text = "aspirin";
        let analysis = Analysis {
            entities: vec![span(text, "aspirin", Some(3))],
            sentences: Vec::new(),
        };

        let err = contextualizer(analysis).contextualize(text).unwrap_err();
        assert!(matches!(err, SciexError::Recognition(_)));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    proptest! {
        #[test]
        fn prop_records_round_trip_offsets(
            words in proptest::collection::vec("[a-zαβ]{1,8}", 1..30),
            picks in proptest::collection::vec(any::<proptest::sample::Index>(), 0..8),
            window in 0usize..40,
        ) {
            let text = words.join(" ");
            let mut starts = Vec::new();
            let mut offset = 0;
            for word in &words {
                starts.push((offset, word.clone()));
                offset += word.len() + 1;
            }

            let entities: Vec<EntitySpan> = picks
                .iter()
                .map(|pick| {
                    let (start, word) = pick.get(&starts).clone();
                    EntitySpan {
                        end: start + word.len(),
                        text: word,
                        label: "X".to_string(),
                        start,
                        sentence: None,
                    }
                })
                .collect();

            let analysis = Analysis { entities, sentences: Vec::new() };
            let records = contextualizer(analysis.clone())
                .with_window_size(window)
                .contextualize(&text)
                .unwrap();

            prop_assert_eq!(records.len(), analysis.entities.len());
            let char_len = text.chars().count();
            for record in &records {
                prop_assert!(record.start < record.end);
                prop_assert!(record.end <= char_len);
                prop_assert_eq!(char_slice(&text, record.start, record.end), record.text.clone());
                prop_assert!(record.context.contains(&record.text));
            }
        }
    }
}
