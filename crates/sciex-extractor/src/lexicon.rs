//! Lexicon-backed NER model
//!
//! The model artifact is a JSON file with dictionary terms (plus aliases),
//! regex patterns, and sentence segmenter settings. Matching combines:
//! - Dictionary lookup: all surfaces compiled into one word-bounded
//!   alternation, longest surfaces first
//! - Pattern rules: one regex per rule
//!
//! Overlapping candidates are resolved leftmost first, then longest, so the
//! model reports non-overlapping spans in document order.

use std::collections::HashMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::segment::{SentenceSegmenter, DEFAULT_ABBREVIATIONS};
use crate::{Analysis, EntityRecognizer, EntitySpan, SentenceSpan};
use sciex_core::{Result, SciexError};

// ============================================================================
// Artifact Format
// ============================================================================

/// On-disk model description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Match dictionary terms case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub terms: Vec<TermEntry>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
    #[serde(default)]
    pub segmenter: SegmenterSettings,
}

/// Dictionary entry for entity matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub text: String,
    pub label: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Regex rule producing entities of one label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub pattern: String,
    pub label: String,
}

/// Sentence segmentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the built-in abbreviation list when non-empty
    #[serde(default)]
    pub abbreviations: Vec<String>,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            abbreviations: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Model
// ============================================================================

/// A loaded lexicon model
pub struct LexiconModel {
    name: String,
    version: String,
    case_sensitive: bool,
    /// Combined dictionary matcher, absent when the model has no terms
    dictionary: Option<Regex>,
    /// Surface (lowercased unless case-sensitive) -> label
    labels: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
    segmenter: Option<SentenceSegmenter>,
}

impl LexiconModel {
    /// Load a model artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("Required model '{}' not found: {}", path.display(), e);
            SciexError::ModelUnavailable {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let artifact: ModelArtifact = serde_json::from_str(&content).map_err(|e| {
            SciexError::InvalidModel(format!("{}: {}", path.display(), e))
        })?;

        let model = Self::from_artifact(artifact)?;
        debug!("Loaded '{}' model successfully", model.name);
        Ok(model)
    }

    /// Build a model from an in-memory artifact
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.terms.is_empty() && artifact.patterns.is_empty() {
            return Err(SciexError::InvalidModel(format!(
                "model '{}' declares no terms and no patterns",
                artifact.name
            )));
        }

        let case_sensitive = artifact.case_sensitive;
        let key = |s: &str| {
            if case_sensitive {
                s.to_string()
            } else {
                s.to_lowercase()
            }
        };

        let mut labels = HashMap::new();
        for term in &artifact.terms {
            for surface in std::iter::once(&term.text).chain(term.aliases.iter()) {
                let surface = surface.trim();
                if !surface.is_empty() {
                    labels
                        .entry(key(surface))
                        .or_insert_with(|| term.label.clone());
                }
            }
        }

        let dictionary = if labels.is_empty() {
            None
        } else {
            let mut surfaces: Vec<&String> = labels.keys().collect();
            surfaces.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            let alternation = surfaces
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|");

            let regex = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| SciexError::InvalidModel(format!("dictionary: {e}")))?;
            Some(regex)
        };

        let patterns = artifact
            .patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|regex| (regex, p.label.clone()))
                    .map_err(|e| {
                        SciexError::InvalidModel(format!("pattern '{}': {}", p.pattern, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let segmenter = artifact.segmenter.enabled.then(|| {
            if artifact.segmenter.abbreviations.is_empty() {
                SentenceSegmenter::with_abbreviations(DEFAULT_ABBREVIATIONS.iter().copied())
            } else {
                SentenceSegmenter::with_abbreviations(&artifact.segmenter.abbreviations)
            }
        });

        Ok(Self {
            name: artifact.name,
            version: artifact.version,
            case_sensitive,
            dictionary,
            labels,
            patterns,
            segmenter,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of distinct dictionary surfaces, aliases included
    pub fn term_count(&self) -> usize {
        self.labels.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn segments_sentences(&self) -> bool {
        self.segmenter.is_some()
    }

    /// Collect every dictionary and pattern match as (start, end, label)
    fn candidates(&self, text: &str) -> Vec<(usize, usize, &str)> {
        let mut candidates = Vec::new();

        if let Some(dictionary) = &self.dictionary {
            for mat in dictionary.find_iter(text) {
                let key = if self.case_sensitive {
                    mat.as_str().to_string()
                } else {
                    mat.as_str().to_lowercase()
                };
                let label = self.labels.get(&key).map(String::as_str).unwrap_or("ENTITY");
                candidates.push((mat.start(), mat.end(), label));
            }
        }

        for (regex, label) in &self.patterns {
            for mat in regex.find_iter(text) {
                if mat.start() < mat.end() {
                    candidates.push((mat.start(), mat.end(), label.as_str()));
                }
            }
        }

        candidates
    }
}

/// Keep the leftmost, then longest, candidate of every overlapping group
fn resolve_overlaps<'a>(mut candidates: Vec<(usize, usize, &'a str)>) -> Vec<(usize, usize, &'a str)> {
    // Stable sort keeps dictionary matches ahead of equal pattern matches
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut result = Vec::with_capacity(candidates.len());
    let mut covered_until = 0;
    for candidate in candidates {
        if candidate.0 >= covered_until {
            covered_until = candidate.1;
            result.push(candidate);
        }
    }
    result
}

/// Index of the sentence that fully contains `start..end`
fn enclosing_sentence(sentences: &[SentenceSpan], start: usize, end: usize) -> Option<usize> {
    let candidate = sentences.partition_point(|s| s.start <= start).checked_sub(1)?;
    let sentence = sentences[candidate];
    (end <= sentence.end).then_some(candidate)
}

impl EntityRecognizer for LexiconModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, text: &str) -> Result<Analysis> {
        let sentences = self
            .segmenter
            .as_ref()
            .map(|s| s.segment(text))
            .unwrap_or_default();

        let entities = resolve_overlaps(self.candidates(text))
            .into_iter()
            .map(|(start, end, label)| EntitySpan {
                text: text[start..end].to_string(),
                label: label.to_string(),
                start,
                end,
                sentence: enclosing_sentence(&sentences, start, end),
            })
            .collect();

        Ok(Analysis {
            entities,
            sentences,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ModelArtifact {
        serde_json::from_value(serde_json::json!({
            "name": "test_sci",
            "version": "0.1.0",
            "terms": [
                { "text": "aspirin", "label": "CHEMICAL", "aliases": ["acetylsalicylic acid"] },
                { "text": "acid", "label": "CHEMICAL" },
                { "text": "breast cancer", "label": "DISEASE" },
                { "text": "cancer", "label": "DISEASE" }
            ],
            "patterns": [
                { "pattern": r"\bIL-\d+\b", "label": "GENE_OR_GENE_PRODUCT" }
            ]
        }))
        .unwrap()
    }

    fn texts(analysis: &Analysis) -> Vec<&str> {
        analysis.entities.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_dictionary_match_case_insensitive() {
        let model = LexiconModel::from_artifact(artifact()).unwrap();
        let analysis = model
            .analyze("Patients received 10mg of Aspirin daily.")
            .unwrap();

        assert_eq!(texts(&analysis), vec!["Aspirin"]);
        let entity = &analysis.entities[0];
        assert_eq!((entity.start, entity.end), (26, 33));
        assert_eq!(entity.label, "CHEMICAL");
        assert_eq!(entity.sentence, Some(0));
    }

    #[test]
    fn test_longest_match_wins() {
        let model = LexiconModel::from_artifact(artifact()).unwrap();
        let analysis = model
            .analyze("Acetylsalicylic acid may lower breast cancer risk.")
            .unwrap();

        assert_eq!(texts(&analysis), vec!["Acetylsalicylic acid", "breast cancer"]);
    }

    #[test]
    fn test_word_boundaries_respected() {
        let model = LexiconModel::from_artifact(artifact()).unwrap();
        let analysis = model.analyze("Aspirinated compounds are not aspirin.").unwrap();

        assert_eq!(texts(&analysis), vec!["aspirin"]);
    }

    #[test]
    fn test_repeated_entities_kept_in_document_order() {
        let model = LexiconModel::from_artifact(artifact()).unwrap();
        let analysis = model
            .analyze("IL-6 rose. Aspirin lowered IL-6. Aspirin again.")
            .unwrap();

        assert_eq!(texts(&analysis), vec!["IL-6", "Aspirin", "IL-6", "Aspirin"]);
        let starts: Vec<usize> = analysis.entities.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![0, 11, 27, 33]);
        assert_eq!(analysis.sentences.len(), 3);
        let sentence_ids: Vec<Option<usize>> =
            analysis.entities.iter().map(|e| e.sentence).collect();
        assert_eq!(sentence_ids, vec![Some(0), Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn test_entity_crossing_sentence_has_no_sentence() {
        let model = LexiconModel::from_artifact(artifact()).unwrap();
        let sentences = vec![
            SentenceSpan { start: 0, end: 10 },
            SentenceSpan { start: 11, end: 20 },
        ];

        assert_eq!(enclosing_sentence(&sentences, 2, 8), Some(0));
        assert_eq!(enclosing_sentence(&sentences, 12, 20), Some(1));
        assert_eq!(enclosing_sentence(&sentences, 8, 14), None);
        assert_eq!(enclosing_sentence(&[], 0, 1), None);
        assert!(model.segments_sentences());
    }

    #[test]
    fn test_segmenter_disabled() {
        let mut artifact = artifact();
        artifact.segmenter.enabled = false;
        let model = LexiconModel::from_artifact(artifact).unwrap();

        let analysis = model.analyze("Aspirin works.").unwrap();
        assert!(analysis.sentences.is_empty());
        assert_eq!(analysis.entities[0].sentence, None);
    }

    #[test]
    fn test_empty_model_rejected() {
        let artifact = ModelArtifact {
            name: "empty".to_string(),
            version: String::new(),
            case_sensitive: false,
            terms: Vec::new(),
            patterns: Vec::new(),
            segmenter: SegmenterSettings::default(),
        };
        assert!(matches!(
            LexiconModel::from_artifact(artifact),
            Err(SciexError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut artifact = artifact();
        artifact.patterns.push(PatternEntry {
            pattern: "(unclosed".to_string(),
            label: "BROKEN".to_string(),
        });
        assert!(matches!(
            LexiconModel::from_artifact(artifact),
            Err(SciexError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_load_missing_artifact() {
        let err = LexiconModel::load(Path::new("models/does_not_exist.json"))
            .err()
            .unwrap();
        assert!(matches!(err, SciexError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&artifact()).unwrap()).unwrap();

        let model = LexiconModel::load(&path).unwrap();
        assert_eq!(model.name(), "test_sci");
        assert_eq!(model.version(), "0.1.0");
        assert_eq!(model.term_count(), 5);
        assert_eq!(model.pattern_count(), 1);
    }

    #[test]
    fn test_load_malformed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            LexiconModel::load(&path),
            Err(SciexError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_shipped_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models/en_core_sci_lexicon.json");
        let model = LexiconModel::load(&path).unwrap();

        let analysis = model
            .analyze("Patients received 10mg of Aspirin daily.")
            .unwrap();
        assert_eq!(texts(&analysis), vec!["Aspirin"]);
    }
}
