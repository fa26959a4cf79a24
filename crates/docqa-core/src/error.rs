use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source '{source_name}' is empty after whitespace normalization")]
    EmptySource { source_name: String },

    #[error("unsupported language '{0}' (expected 'en' or 'fa')")]
    UnsupportedLanguage(String),

    #[error("incompatible index file {}: {reason}", path.display())]
    IncompatibleIndex { path: PathBuf, reason: String },

    #[error("corrupt index file {}: {reason}", path.display())]
    CorruptIndex { path: PathBuf, reason: String },

    #[error("index config mismatch: {0}")]
    IndexConfigMismatch(String),

    #[error("failed to read source {}: {reason}", path.display())]
    SourceRead { path: PathBuf, reason: String },

    #[error("answer synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("embedding failed during {stage}: {reason}")]
    Embedding { stage: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid index: {0}")]
    InvalidIndex(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn embedding(stage: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Embedding { stage, reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
