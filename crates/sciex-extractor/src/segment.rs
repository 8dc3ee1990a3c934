//! Sentence segmentation
//!
//! Candidate boundaries come from the Unicode sentence rules (UAX #29),
//! which already keep closing quotes and brackets with their sentence and
//! never break before a lowercase continuation. A merge pass then undoes
//! the boundaries scientific prose does not want:
//! - a period after a known abbreviation or a single capital initial
//! - a lone line break (only a blank line separates paragraphs)
//! - a terminator glued to the next word, as in `Fig.3`

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::SentenceSpan;

/// Abbreviations common in scientific prose, lowercase, without the final period
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "al", "approx", "ca", "cf", "dr", "e.g", "eq", "eqs", "fig", "figs", "i.e", "inc", "mr", "mrs",
    "ms", "no", "nos", "prof", "ref", "refs", "resp", "sp", "spp", "st", "vol", "vs", "viz",
];

const CLOSERS: &[char] = &['"', '\'', ')', ']', '}', '\u{201D}', '\u{2019}'];
const OPENERS: &[char] = &['(', '[', '{', '"', '\'', '\u{201C}', '\u{2018}'];

/// Splits text into sentence spans
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    abbreviations: HashSet<String>,
}

impl SentenceSegmenter {
    /// Segmenter with [`DEFAULT_ABBREVIATIONS`]
    pub fn new() -> Self {
        Self::with_abbreviations(DEFAULT_ABBREVIATIONS.iter().copied())
    }

    /// Segmenter with a custom abbreviation list. Entries may carry a trailing period.
    pub fn with_abbreviations<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let abbreviations = abbreviations
            .into_iter()
            .map(|a| a.as_ref().trim().trim_end_matches('.').to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        Self { abbreviations }
    }

    /// Segment `text` into sentences. Spans never include leading or trailing whitespace.
    pub fn segment(&self, text: &str) -> Vec<SentenceSpan> {
        let mut sentences = Vec::new();
        let mut open: Option<usize> = None;

        for (offset, piece) in text.split_sentence_bound_indices() {
            let start = match open {
                Some(start) => start,
                None => {
                    let leading = piece.len() - piece.trim_start().len();
                    if leading == piece.len() {
                        continue;
                    }
                    offset + leading
                }
            };

            if self.closes_sentence(text, start, offset + piece.len()) {
                sentences.push(trimmed_span(text, start, offset + piece.len()));
                open = None;
            } else {
                open = Some(start);
            }
        }

        if let Some(start) = open {
            sentences.push(trimmed_span(text, start, text.len()));
        }

        sentences
    }

    /// Whether the Unicode boundary at `boundary` ends the sentence opened at `start`
    fn closes_sentence(&self, text: &str, start: usize, boundary: usize) -> bool {
        let content = text[start..boundary].trim_end();
        let rest = &text[boundary..];
        let after = rest.trim_start();
        let Some(next) = after.chars().next() else {
            return true;
        };

        let gap = &text[start + content.len()..boundary + (rest.len() - after.len())];
        if gap.matches('\n').count() >= 2 {
            return true;
        }
        if gap.is_empty() || next.is_lowercase() {
            return false;
        }

        let body = content.trim_end_matches(CLOSERS);
        match body.chars().last() {
            Some('.') => {}
            Some(c) => return is_terminator(c),
            None => return false,
        }

        // Only a lone period can belong to an abbreviation
        let stem = &body[..body.len() - 1];
        if stem.ends_with(is_terminator) {
            return true;
        }

        let token = stem
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .trim_start_matches(OPENERS);
        if self.abbreviations.contains(&token.to_lowercase()) {
            return false;
        }

        let mut token_chars = token.chars();
        let is_initial = matches!(
            (token_chars.next(), token_chars.next()),
            (Some(first), None) if first.is_uppercase()
        );

        !is_initial
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}' | '\u{3002}' | '\u{FF01}' | '\u{FF1F}')
}

fn trimmed_span(text: &str, start: usize, end: usize) -> SentenceSpan {
    SentenceSpan {
        start,
        end: start + text[start..end].trim_end().len(),
    }
}
