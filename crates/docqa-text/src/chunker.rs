//! Sentence-aware chunking with word overlap.
//!
//! Sentences are packed greedily into windows of at most `max_size` words.
//! When a window closes, its last `overlap` words are carried into the next
//! one. A single sentence longer than `max_size` becomes one oversized chunk
//! rather than being cut mid-sentence.

use std::ops::Range;

use docqa_core::config::SplitterMode;
use docqa_core::types::{Chunk, ChunkConfig, Language, Span};
use docqa_core::Result;

use crate::normalize::word_spans;
use crate::splitter::{splitter_for, SentenceSplitter};

pub struct Chunker {
    config: ChunkConfig,
    splitter: Box<dyn SentenceSplitter>,
}

impl Chunker {
    pub fn new(language: Language, config: ChunkConfig, mode: SplitterMode) -> Result<Self> {
        Self::with_splitter(config, splitter_for(language, mode))
    }

    pub fn with_splitter(config: ChunkConfig, splitter: Box<dyn SentenceSplitter>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, splitter })
    }

    pub fn language(&self) -> Language {
        self.splitter.language()
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    pub fn splitter_name(&self) -> &'static str {
        self.splitter.name()
    }

    pub fn normalize(&self, text: &str) -> String {
        self.splitter.normalize(text)
    }

    /// Normalize `text` and split it into chunks. Returns an empty list when
    /// the text holds no words.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.chunk_normalized(&self.normalize(text))
    }

    /// Chunk text that has already been through [`Chunker::normalize`].
    /// Spans index into `normalized`.
    pub fn chunk_normalized(&self, normalized: &str) -> Vec<Chunk> {
        let words = word_spans(normalized);
        if words.is_empty() {
            return Vec::new();
        }
        let sentences = self.splitter.detect_sentences(normalized);
        let groups = sentence_word_groups(&words, &sentences);
        let windows = pack_windows(&groups, self.config);

        let language = self.language();
        let chunks: Vec<Chunk> = windows
            .into_iter()
            .enumerate()
            .map(|(ordinal, window)| {
                let span = Span { start: words[window.start].start, end: words[window.end - 1].end };
                Chunk { text: normalized[span.start..span.end].to_string(), ordinal, char_span: span, language }
            })
            .collect();
        tracing::debug!(
            splitter = self.splitter_name(),
            words = words.len(),
            sentences = sentences.len(),
            chunks = chunks.len(),
            "chunked text"
        );
        chunks
    }
}

/// One-shot helper: chunk `text` with the default splitter for `language`.
pub fn chunk(text: &str, language: Language, max_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(language, ChunkConfig::new(max_size, overlap)?, SplitterMode::default())?;
    Ok(chunker.chunk(text))
}

/// Partition word indices into contiguous per-sentence groups. A word belongs
/// to the last sentence starting at or before it, so words outside every
/// detected sentence still land somewhere and nothing is dropped.
fn sentence_word_groups(words: &[Range<usize>], sentences: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut groups: Vec<Range<usize>> = Vec::new();
    let mut sentence = 0;
    for (i, word) in words.iter().enumerate() {
        let mut advanced = false;
        while sentence < sentences.len() && sentences[sentence].start <= word.start {
            sentence += 1;
            advanced = true;
        }
        match groups.last_mut() {
            Some(group) if !advanced => group.end = i + 1,
            _ => groups.push(i..i + 1),
        }
    }
    groups
}

/// Greedy packing of sentence groups into word windows.
fn pack_windows(groups: &[Range<usize>], config: ChunkConfig) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    let mut window: Option<Range<usize>> = None;
    for group in groups {
        let incoming = group.len();
        window = Some(match window.take() {
            Some(open) if open.len() + incoming > config.max_size => {
                let keep = config.overlap.min(open.len());
                let start = open.end - keep;
                windows.push(open);
                start..group.end
            }
            Some(open) => open.start..group.end,
            None => group.clone(),
        });
    }
    windows.extend(window);
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_follow_sentence_starts() {
        let words = vec![0..3, 4..7, 8..10, 11..14];
        let sentences = vec![0..7, 8..14];
        assert_eq!(sentence_word_groups(&words, &sentences), vec![0..2, 2..4]);
    }

    #[test]
    fn packing_carries_overlap() {
        let groups = vec![0..3, 3..6, 6..10];
        let config = ChunkConfig { max_size: 5, overlap: 2 };
        assert_eq!(pack_windows(&groups, config), vec![0..3, 1..6, 4..10]);
    }

    #[test]
    fn oversized_group_is_kept_whole() {
        let groups = vec![0..12];
        let config = ChunkConfig { max_size: 5, overlap: 1 };
        assert_eq!(pack_windows(&groups, config), vec![0..12]);
    }
}
