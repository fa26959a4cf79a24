//! Domain types shared by the chunker, embedders, index and retriever.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Dense embedding of a chunk or a query.
pub type Vector = Vec<f32>;

/// Natural languages with a dedicated sentence splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fa")]
    Persian,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Persian => "fa",
        }
    }

    /// Default words per chunk. Persian text runs denser per word, so its
    /// windows are smaller.
    pub fn default_chunk_size(self) -> usize {
        match self {
            Self::English => 600,
            Self::Persian => 400,
        }
    }

    pub fn default_overlap(self) -> usize {
        match self {
            Self::English => 120,
            Self::Persian => 80,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Self::English),
            "fa" | "fas" | "per" | "persian" | "farsi" => Ok(Self::Persian),
            _ => Err(Error::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Half-open byte range `[start, end)` into the normalized source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A contiguous passage of the normalized source text.
///
/// - `text`: the passage, equal to `normalized[char_span.start..char_span.end]`
/// - `ordinal`: 0-based position in the source
/// - `char_span`: byte offsets into the normalized source
/// - `language`: language of the splitter that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub ordinal: usize,
    pub char_span: Span,
    pub language: Language,
}

impl Chunk {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// First `max_chars` characters, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.text, max_chars)
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Chunk window sizes, both measured in whitespace-separated words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub max_size: usize,
    pub overlap: usize,
}

impl ChunkConfig {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn for_language(language: Language) -> Self {
        Self { max_size: language.default_chunk_size(), overlap: language.default_overlap() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be greater than zero".into()));
        }
        if self.overlap >= self.max_size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }
}

/// Which embedding implementation produced a set of vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Tfidf,
    Hashing,
    Dense,
}

impl EmbeddingBackend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Hashing => "hashing",
            Self::Dense => "dense",
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(Self::Tfidf),
            "hashing" | "hash" => Ok(Self::Hashing),
            "dense" | "sbert" => Ok(Self::Dense),
            other => Err(Error::InvalidConfig(format!("unknown embedding backend '{other}'"))),
        }
    }
}

/// Fitted TF-IDF model. `vocabulary` is sorted lexicographically and
/// `idf[i]` belongs to `vocabulary[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfState {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub ngram_range: (usize, usize),
    pub max_features: Option<usize>,
    pub min_token_chars: usize,
}

impl TfidfState {
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.binary_search_by(|probe| probe.as_str().cmp(term)).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingState {
    pub dimension: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseState {
    pub model_id: String,
    pub dimension: usize,
    pub max_len: usize,
}

/// Everything needed to embed future queries the same way the index was embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum EmbedderState {
    Tfidf(TfidfState),
    Hashing(HashingState),
    Dense(DenseState),
}

impl EmbedderState {
    pub fn backend(&self) -> EmbeddingBackend {
        match self {
            Self::Tfidf(_) => EmbeddingBackend::Tfidf,
            Self::Hashing(_) => EmbeddingBackend::Hashing,
            Self::Dense(_) => EmbeddingBackend::Dense,
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::Tfidf(state) => state.vocabulary.len(),
            Self::Hashing(state) => state.dimension,
            Self::Dense(state) => state.dimension,
        }
    }
}

/// Build metadata stored alongside the vectors; used to validate queries
/// and for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub language: Language,
    pub chunk_size: usize,
    pub overlap: usize,
    pub backend: EmbeddingBackend,
    pub dimension: usize,
    pub splitter: String,
    #[serde(default)]
    pub source_name: Option<String>,
}
