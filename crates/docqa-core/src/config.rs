//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `docqa.toml` + `docqa.<env>.toml` + `DOCQA_*` env vars
//! (`__` separates nested keys, e.g. `DOCQA_EMBEDDING__BACKEND=hashing`).
//! The loaded [`Settings`] are handed to the pipeline explicitly; nothing below
//! the binary reads the environment on its own.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{ChunkConfig, EmbeddingBackend, Language};

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from `dir` for the environment named by `RUST_ENV` (default `dev`).
    pub fn load_in(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(dir, &env_name)
    }

    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("docqa.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("docqa.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("docqa.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("docqa.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DOCQA_").split("__"));
        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Which sentence splitter family the chunker should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterMode {
    /// Terminal-punctuation splitter; always available.
    Basic,
    /// Unicode sentence segmentation; degrades to `Basic` when the
    /// `segmentation` feature of docqa-text is compiled out.
    #[default]
    Enhanced,
}

/// How sources are cited in a synthesized answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationMode {
    Inline,
    #[default]
    Refs,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfParams {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub max_features: Option<usize>,
    pub min_token_chars: usize,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self { ngram_min: 1, ngram_max: 2, max_features: Some(50_000), min_token_chars: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingParams {
    pub dimension: usize,
    pub seed: u64,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self { dimension: 1024, seed: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseParams {
    pub model_dir: Option<PathBuf>,
    pub max_len: usize,
}

impl Default for DenseParams {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub tfidf: TfidfParams,
    pub hashing: HashingParams,
    pub dense: DenseParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Words per chunk; `None` uses the language default.
    pub chunk_size: Option<usize>,
    pub overlap: Option<usize>,
    pub splitter: SplitterMode,
}

impl ChunkingSettings {
    /// Resolve against the language defaults. A chunk size given without an
    /// overlap gets a fifth of itself as overlap, capped at the default.
    pub fn chunk_config(&self, language: Language) -> Result<ChunkConfig> {
        let defaults = ChunkConfig::for_language(language);
        let max_size = self.chunk_size.unwrap_or(defaults.max_size);
        let overlap = match (self.overlap, self.chunk_size) {
            (Some(overlap), _) => overlap,
            (None, Some(size)) => defaults.overlap.min(size / 5),
            (None, None) => defaults.overlap,
        };
        ChunkConfig::new(max_size, overlap)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub top_k: usize,
    pub citations: CitationMode,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { top_k: 4, citations: CitationMode::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub language: String,
    pub encoding: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self { language: "en".to_string(), encoding: "utf-8".to_string() }
    }
}

/// Typed view over the merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingConfig,
    pub query: QuerySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let language: Language = self.source.language.parse()?;
        self.chunking.chunk_config(language)?;
        if self.query.top_k == 0 {
            return Err(Error::InvalidConfig("query.top_k must be greater than zero".into()));
        }
        let tfidf = &self.embedding.tfidf;
        if tfidf.ngram_min == 0 || tfidf.ngram_min > tfidf.ngram_max {
            return Err(Error::InvalidConfig(format!(
                "invalid tfidf ngram range ({}, {})",
                tfidf.ngram_min, tfidf.ngram_max
            )));
        }
        if self.embedding.hashing.dimension == 0 {
            return Err(Error::InvalidConfig("hashing dimension must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
