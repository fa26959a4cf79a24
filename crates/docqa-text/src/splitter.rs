//! Sentence boundary detection, one implementation family per strategy and
//! one variant per language.
//!
//! The chunk contract does not depend on which splitter is used: a splitter
//! only reports byte ranges of sentences inside already-normalized text.

use std::ops::Range;

use docqa_core::config::SplitterMode;
use docqa_core::types::Language;

use crate::normalize::{fold_persian, normalize_whitespace};

pub trait SentenceSplitter: Send + Sync {
    /// Stable identifier recorded in the index config, e.g. `punctuation-en`.
    fn name(&self) -> &'static str;

    fn language(&self) -> Language;

    /// Normalization applied to source text (and to queries) before
    /// splitting. Must not change the text in a way that breaks byte offsets
    /// of the returned string itself.
    fn normalize(&self, text: &str) -> String {
        normalize_whitespace(text)
    }

    /// Byte ranges of the sentences of `text`, in order, trimmed and non-empty.
    fn detect_sentences(&self, text: &str) -> Vec<Range<usize>>;
}

const EN_TERMINATORS: &[char] = &['.', '!', '?'];
const FA_TERMINATORS: &[char] = &['.', '!', '?', '؟', '…'];

/// Ends a sentence at a terminator followed by whitespace or end of text.
#[derive(Debug, Clone)]
pub struct PunctuationSplitter {
    language: Language,
    terminators: &'static [char],
}

impl PunctuationSplitter {
    pub fn for_language(language: Language) -> Self {
        let terminators = match language {
            Language::English => EN_TERMINATORS,
            Language::Persian => FA_TERMINATORS,
        };
        Self { language, terminators }
    }
}

impl SentenceSplitter for PunctuationSplitter {
    fn name(&self) -> &'static str {
        match self.language {
            Language::English => "punctuation-en",
            Language::Persian => "punctuation-fa",
        }
    }

    fn language(&self) -> Language {
        self.language
    }

    fn detect_sentences(&self, text: &str) -> Vec<Range<usize>> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for (i, c) in text.char_indices() {
            if !self.terminators.contains(&c) {
                continue;
            }
            let end = i + c.len_utf8();
            let at_boundary = text[end..].chars().next().map_or(true, char::is_whitespace);
            if at_boundary {
                if let Some(range) = trimmed(text, start..end) {
                    sentences.push(range);
                }
                start = end;
            }
        }
        if let Some(range) = trimmed(text, start..text.len()) {
            sentences.push(range);
        }
        sentences
    }
}

/// Unicode (UAX #29) sentence segmentation.
///
/// The English variant re-joins boundaries that directly follow a common
/// abbreviation; the Persian variant folds Arabic letter forms during
/// normalization so that identical words index identically.
#[cfg(feature = "segmentation")]
#[derive(Debug, Clone)]
pub struct SegmentationSplitter {
    language: Language,
}

#[cfg(feature = "segmentation")]
const EN_ABBREVIATIONS: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "etc.", "e.g.", "i.e.",
    "no.", "fig.", "inc.", "ltd.", "co.", "jan.", "feb.", "aug.", "sept.", "oct.", "nov.", "dec.",
];

#[cfg(feature = "segmentation")]
impl SegmentationSplitter {
    pub fn for_language(language: Language) -> Self {
        Self { language }
    }

    fn ends_with_abbreviation(sentence: &str) -> bool {
        sentence
            .rsplit(' ')
            .next()
            .map(|last| EN_ABBREVIATIONS.contains(&last.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

#[cfg(feature = "segmentation")]
impl SentenceSplitter for SegmentationSplitter {
    fn name(&self) -> &'static str {
        match self.language {
            Language::English => "segmentation-en",
            Language::Persian => "segmentation-fa",
        }
    }

    fn language(&self) -> Language {
        self.language
    }

    fn normalize(&self, text: &str) -> String {
        let normalized = normalize_whitespace(text);
        match self.language {
            Language::English => normalized,
            Language::Persian => fold_persian(&normalized),
        }
    }

    fn detect_sentences(&self, text: &str) -> Vec<Range<usize>> {
        use unicode_segmentation::UnicodeSegmentation;

        let mut sentences: Vec<Range<usize>> = Vec::new();
        for (offset, piece) in text.split_sentence_bound_indices() {
            let Some(range) = trimmed(text, offset..offset + piece.len()) else {
                continue;
            };
            let merge = self.language == Language::English
                && sentences.last().is_some_and(|prev| Self::ends_with_abbreviation(&text[prev.clone()]));
            match sentences.last_mut() {
                Some(prev) if merge => prev.end = range.end,
                _ => sentences.push(range),
            }
        }
        sentences
    }
}

/// Build the splitter for `language`. `Enhanced` falls back to the
/// punctuation splitter of the same language when segmentation support is
/// compiled out; a different language's splitter is never substituted.
pub fn splitter_for(language: Language, mode: SplitterMode) -> Box<dyn SentenceSplitter> {
    match mode {
        SplitterMode::Basic => Box::new(PunctuationSplitter::for_language(language)),
        SplitterMode::Enhanced => enhanced_splitter(language),
    }
}

/// Rebuild a splitter from the name stored in an index config.
pub fn splitter_by_name(language: Language, name: &str) -> Option<Box<dyn SentenceSplitter>> {
    [SplitterMode::Basic, SplitterMode::Enhanced]
        .into_iter()
        .map(|mode| splitter_for(language, mode))
        .find(|splitter| splitter.name() == name)
}

#[cfg(feature = "segmentation")]
fn enhanced_splitter(language: Language) -> Box<dyn SentenceSplitter> {
    Box::new(SegmentationSplitter::for_language(language))
}

#[cfg(not(feature = "segmentation"))]
fn enhanced_splitter(language: Language) -> Box<dyn SentenceSplitter> {
    tracing::warn!(%language, "segmentation support not compiled in; using punctuation splitter");
    Box::new(PunctuationSplitter::for_language(language))
}

fn trimmed(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let start = range.start + (slice.len() - slice.trim_start().len());
    let end = range.end - (slice.len() - slice.trim_end().len());
    (start < end).then_some(start..end)
}
