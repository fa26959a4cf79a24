use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, EmbedderState, IndexConfig, Language, Vector};
use docqa_core::{Error, Result};
use docqa_text::Chunker;

/// Chunks of one source, their vectors, and the embedder state needed to
/// embed queries the same way. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    config: IndexConfig,
    chunks: Vec<Chunk>,
    vectors: Vec<Vector>,
    embedder_state: EmbedderState,
}

impl Index {
    /// Assemble an index, checking that chunks, vectors, dimension and
    /// backend agree, and that chunks are in source order and in the index
    /// language.
    pub fn new(
        config: IndexConfig,
        chunks: Vec<Chunk>,
        vectors: Vec<Vector>,
        embedder_state: EmbedderState,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::InvalidIndex(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        if embedder_state.backend() != config.backend {
            return Err(Error::InvalidIndex(format!(
                "config says {} but embedder state is {}",
                config.backend,
                embedder_state.backend()
            )));
        }
        if embedder_state.dimension() != config.dimension {
            return Err(Error::InvalidIndex(format!(
                "config dimension {} != embedder dimension {}",
                config.dimension,
                embedder_state.dimension()
            )));
        }
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != config.dimension) {
            return Err(Error::InvalidIndex(format!(
                "vector {i} has {} entries, expected {}",
                v.len(),
                config.dimension
            )));
        }
        if let Some((i, c)) = chunks.iter().enumerate().find(|(i, c)| c.ordinal != *i) {
            return Err(Error::InvalidIndex(format!("chunk at position {i} has ordinal {}", c.ordinal)));
        }
        if let Some(c) = chunks.iter().find(|c| c.language != config.language) {
            return Err(Error::InvalidIndex(format!(
                "chunk {} is {} but the index is {}",
                c.ordinal, c.language, config.language
            )));
        }
        if let Some(pair) = chunks.windows(2).find(|w| w[1].char_span.start < w[0].char_span.start) {
            return Err(Error::InvalidIndex(format!(
                "chunk {} starts at {}, before chunk {} at {}",
                pair[1].ordinal, pair[1].char_span.start, pair[0].ordinal, pair[0].char_span.start
            )));
        }
        Ok(Self { config, chunks, vectors, embedder_state })
    }

    /// Chunk `text`, fit the embedder on the chunks, and embed them.
    pub fn build(text: &str, source_name: &str, chunker: &Chunker, embedder: &dyn Embedder) -> Result<Self> {
        let normalized = chunker.normalize(text);
        if normalized.is_empty() {
            return Err(Error::EmptySource { source_name: source_name.to_string() });
        }
        let chunks = chunker.chunk_normalized(&normalized);
        tracing::info!(source = source_name, chunks = chunks.len(), "chunked source");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let state = embedder.fit(&texts)?;
        let vectors = embedder.transform(&texts, &state)?;
        tracing::info!(backend = %state.backend(), dimension = state.dimension(), "embedded chunks");

        let chunk_config = chunker.config();
        let config = IndexConfig {
            language: chunker.language(),
            chunk_size: chunk_config.max_size,
            overlap: chunk_config.overlap,
            backend: state.backend(),
            dimension: state.dimension(),
            splitter: chunker.splitter_name().to_string(),
            source_name: Some(source_name.to_string()),
        };
        Self::new(config, chunks, vectors, state)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn embedder_state(&self) -> &EmbedderState {
        &self.embedder_state
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
