//! docqa-pipeline
//!
//! Orchestrates the build path (read → chunk → fit → embed → save) and the
//! query path (load → validate → embed question → retrieve → synthesize).
//! All configuration arrives through [`PipelineConfig`]; nothing here reads
//! the process environment.

pub mod synthesis;

use std::path::Path;

use docqa_core::config::{ChunkingSettings, CitationMode, EmbeddingConfig, Settings, SplitterMode};
use docqa_core::source::SourceReader;
use docqa_core::types::{Chunk, EmbeddingBackend, Language};
use docqa_core::{Error, Result};
use docqa_embed::{embedder_for_state, select_embedder};
use docqa_text::{splitter_by_name, splitter_for, Chunker};
use docqa_vector::{retrieve, storage, Index, RetrievalResult};

pub use synthesis::{build_context, grounded_prompt, ExtractiveSynthesizer, Synthesis, Synthesizer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingConfig,
    pub citations: CitationMode,
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            chunking: settings.chunking.clone(),
            embedding: settings.embedding.clone(),
            citations: settings.query.citations,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: usize,
    /// When set, must match the index language.
    pub language: Option<Language>,
    /// When set, must match the backend the index was built with.
    pub backend: Option<EmbeddingBackend>,
    pub synthesize: bool,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, top_k: usize) -> Self {
        Self { question: question.into(), top_k, language: None, backend: None, synthesize: false }
    }
}

/// A retrieval hit detached from its index.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
}

impl From<&RetrievalResult<'_>> for RankedChunk {
    fn from(r: &RetrievalResult<'_>) -> Self {
        Self { chunk: r.chunk.clone(), score: r.score, rank: r.rank }
    }
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub index: Index,
    pub hits: Vec<RankedChunk>,
    pub answer: Option<Synthesis>,
}

pub struct Pipeline {
    config: PipelineConfig,
    synthesizer: Box<dyn Synthesizer>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let synthesizer = Box::new(ExtractiveSynthesizer::new(config.citations));
        Self { config, synthesizer }
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn chunker(&self, language: Language) -> Result<Chunker> {
        let chunk_config = self.config.chunking.chunk_config(language)?;
        Chunker::new(language, chunk_config, self.config.chunking.splitter)
    }

    pub fn build_index(&self, text: &str, source_name: &str, language: Language) -> Result<Index> {
        let chunker = self.chunker(language)?;
        let embedder = select_embedder(&self.config.embedding)?;
        tracing::info!(
            source = source_name,
            %language,
            splitter = chunker.splitter_name(),
            backend = %embedder.backend(),
            "building index"
        );
        Index::build(text, source_name, &chunker, embedder.as_ref())
    }

    pub fn build_and_save(
        &self,
        source_path: &Path,
        language: Language,
        out_path: &Path,
        reader: &dyn SourceReader,
    ) -> Result<Index> {
        let text = reader.read(source_path)?;
        tracing::debug!(path = %source_path.display(), bytes = text.len(), "read source");
        let source_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.display().to_string());
        let index = self.build_index(&text, &source_name, language)?;
        storage::save(&index, out_path)?;
        Ok(index)
    }

    pub fn load(&self, index_path: &Path) -> Result<Index> {
        storage::load(index_path)
    }

    /// Rank the chunks of `index` against `request.question`. The question
    /// is normalized and embedded exactly as the index's chunks were.
    pub fn query<'a>(&self, index: &'a Index, request: &QueryRequest) -> Result<Vec<RetrievalResult<'a>>> {
        check_compatible(index, request)?;
        let config = index.config();
        let splitter = splitter_by_name(config.language, &config.splitter).unwrap_or_else(|| {
            tracing::warn!(splitter = %config.splitter, "unknown splitter in index; normalizing with punctuation splitter");
            splitter_for(config.language, SplitterMode::Basic)
        });
        let question = splitter.normalize(&request.question);

        let embedder = embedder_for_state(index.embedder_state(), &self.config.embedding)?;
        let query_vector = embedder
            .transform(&[question.as_str()], index.embedder_state())?
            .pop()
            .ok_or_else(|| Error::embedding("transform", "embedder returned no vector for the question"))?;
        let results = retrieve(index, &query_vector, request.top_k)?;
        tracing::info!(hits = results.len(), top_k = request.top_k, "query answered");
        Ok(results)
    }

    /// Synthesize an answer. Synthesizer failures are reported as
    /// [`Synthesis::Unavailable`] rather than as errors.
    pub fn answer(&self, question: &str, results: &[RetrievalResult<'_>], synthesizer: &dyn Synthesizer) -> Synthesis {
        match synthesizer.synthesize(question, results) {
            Ok(text) => Synthesis::Answer(text),
            Err(e) => {
                tracing::warn!(synthesizer = synthesizer.name(), error = %e, "synthesis failed; returning ranked chunks only");
                Synthesis::Unavailable(e.to_string())
            }
        }
    }

    /// Load the index at `index_path`, run `request`, and, when asked,
    /// synthesize an answer with the pipeline's synthesizer.
    pub fn load_and_query(&self, index_path: &Path, request: &QueryRequest) -> Result<QueryOutcome> {
        let index = self.load(index_path)?;
        let (hits, answer) = {
            let results = self.query(&index, request)?;
            let answer = request
                .synthesize
                .then(|| self.answer(&request.question, &results, self.synthesizer.as_ref()));
            (results.iter().map(RankedChunk::from).collect(), answer)
        };
        Ok(QueryOutcome { index, hits, answer })
    }
}

fn check_compatible(index: &Index, request: &QueryRequest) -> Result<()> {
    let config = index.config();
    if let Some(language) = request.language {
        if language != config.language {
            return Err(Error::IndexConfigMismatch(format!(
                "query language {language} but index language {}",
                config.language
            )));
        }
    }
    if let Some(backend) = request.backend {
        if backend != config.backend {
            return Err(Error::IndexConfigMismatch(format!(
                "query backend {backend} but index was built with {}",
                config.backend
            )));
        }
    }
    Ok(())
}
