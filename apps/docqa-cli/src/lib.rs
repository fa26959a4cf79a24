//! Command surface of the `docqa` binary: argument parsing, settings
//! overrides, and rendering of index/query results.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use docqa_core::config::{expand_path, resolve_with_base, CitationMode, Settings, SplitterMode};
use docqa_core::source::FileSourceReader;
use docqa_core::types::{preview, EmbeddingBackend, Language};
use docqa_pipeline::{build_context, grounded_prompt, Pipeline, PipelineConfig, QueryOutcome, QueryRequest, Synthesis};
use docqa_vector::RetrievalResult;

const PREVIEW_CHARS: usize = 120;

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Index a document and ask questions about it, offline")]
pub struct Cli {
    /// Directory holding docqa.toml and docqa.<env>.toml
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and save an index from a PDF or text file
    Index(IndexArgs),
    /// Load an index and answer a question
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// PDF or plain-text file to ingest
    #[arg(long)]
    pub source: String,
    /// Language of the source: en | fa
    #[arg(long)]
    pub lang: Option<Language>,
    /// Output index path
    #[arg(long)]
    pub out: String,
    /// Words per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Words carried over between consecutive chunks
    #[arg(long, alias = "chunk-overlap")]
    pub overlap: Option<usize>,
    #[arg(long)]
    pub backend: Option<EmbeddingBackend>,
    /// Text file encoding (any WHATWG label, e.g. utf-8, windows-1256, latin1)
    #[arg(long)]
    pub encoding: Option<String>,
    #[arg(long, value_enum)]
    pub splitter: Option<SplitterArg>,
    /// Print step-by-step indexing trace
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Path to a saved index
    #[arg(long)]
    pub index: String,
    #[arg(long, short = 'q', alias = "q")]
    pub question: String,
    #[arg(long)]
    pub top_k: Option<usize>,
    /// Compose an extractive answer from the hits
    #[arg(long)]
    pub synthesize: bool,
    #[arg(long, value_enum)]
    pub citations: Option<CitationArg>,
    /// Print the grounded prompt an external model would receive
    #[arg(long)]
    pub print_prompt: bool,
    /// Fail unless the index was built for this language
    #[arg(long)]
    pub lang: Option<Language>,
    /// Fail unless the index was built with this backend
    #[arg(long)]
    pub backend: Option<EmbeddingBackend>,
    /// Print step-by-step query trace
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SplitterArg {
    Basic,
    Enhanced,
}

impl From<SplitterArg> for SplitterMode {
    fn from(arg: SplitterArg) -> Self {
        match arg {
            SplitterArg::Basic => Self::Basic,
            SplitterArg::Enhanced => Self::Enhanced,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CitationArg {
    Inline,
    Refs,
    None,
}

impl From<CitationArg> for CitationMode {
    fn from(arg: CitationArg) -> Self {
        match arg {
            CitationArg::Inline => Self::Inline,
            CitationArg::Refs => Self::Refs,
            CitationArg::None => Self::None,
        }
    }
}

impl Cli {
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Index(args) => args.verbose,
            Command::Query(args) => args.verbose,
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Make configured paths absolute relative to the config directory, after
/// `~` and `$VAR` expansion.
pub fn resolve_paths(settings: &mut Settings, config_dir: &Path) {
    if let Some(dir) = settings.embedding.dense.model_dir.take() {
        settings.embedding.dense.model_dir = Some(resolve_with_base(config_dir, dir.to_string_lossy()));
    }
}

pub fn run(cli: &Cli, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Command::Index(args) => run_index(args, settings, out),
        Command::Query(args) => run_query(args, settings, out),
    }
}

fn run_index(args: &IndexArgs, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let language = match args.lang {
        Some(language) => language,
        None => settings.source.language.parse()?,
    };
    let mut config = PipelineConfig::from(settings);
    if args.chunk_size.is_some() {
        config.chunking.chunk_size = args.chunk_size;
    }
    if args.overlap.is_some() {
        config.chunking.overlap = args.overlap;
    }
    if let Some(backend) = args.backend {
        config.embedding.backend = backend;
    }
    if let Some(splitter) = args.splitter {
        config.chunking.splitter = splitter.into();
    }
    let encoding = args.encoding.as_deref().unwrap_or(&settings.source.encoding);
    let source = expand_path(&args.source);
    let out_path = expand_path(&args.out);
    let chunk_config = config.chunking.chunk_config(language)?;

    if args.verbose {
        writeln!(out, "[docqa][index] source={} encoding={encoding}", source.display())?;
        writeln!(
            out,
            "[docqa][index] lang={language} backend={} chunk={}/{} splitter={:?}",
            config.embedding.backend, chunk_config.max_size, chunk_config.overlap, config.chunking.splitter
        )?;
    }

    let pipeline = Pipeline::new(config);
    let reader = FileSourceReader::new(encoding);
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("indexing {}", source.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let built = pipeline.build_and_save(&source, language, &out_path, &reader);
    spinner.finish_and_clear();
    let index = built.with_context(|| format!("failed to index {}", source.display()))?;

    if args.verbose {
        writeln!(out, "[docqa][index] chunks={} dimension={}", index.len(), index.dimension())?;
        if let Some(first) = index.chunks().first() {
            writeln!(out, "[docqa][index] first_chunk preview='{}'", first.preview(PREVIEW_CHARS))?;
        }
    }
    writeln!(out, "[docqa] Indexed {} chunks → {}", index.len(), out_path.display())?;
    Ok(())
}

fn run_query(args: &QueryArgs, settings: &Settings, out: &mut dyn Write) -> Result<()> {
    let mut config = PipelineConfig::from(settings);
    if let Some(citations) = args.citations {
        config.citations = citations.into();
    }
    let citations = config.citations;
    let index_path = expand_path(&args.index);

    let mut request = QueryRequest::new(args.question.clone(), args.top_k.unwrap_or(settings.query.top_k));
    request.language = args.lang;
    request.backend = args.backend;
    request.synthesize = args.synthesize;

    let pipeline = Pipeline::new(config);
    let QueryOutcome { index, hits, answer } = pipeline
        .load_and_query(&index_path, &request)
        .with_context(|| format!("query against {} failed", index_path.display()))?;

    if args.verbose {
        let meta = index.config();
        writeln!(
            out,
            "[docqa][query] index={} lang={} backend={} chunk={}/{} total_chunks={}",
            index_path.display(),
            meta.language,
            meta.backend,
            meta.chunk_size,
            meta.overlap,
            index.len()
        )?;
        writeln!(
            out,
            "[docqa][query] question='{}' top_k={} citations={citations:?}",
            request.question, request.top_k
        )?;
    }

    writeln!(out, "hits (ranked):")?;
    for hit in &hits {
        writeln!(
            out,
            "  #{} [chunk:{} score:{:.3}] {}",
            hit.rank,
            hit.chunk.ordinal,
            hit.score,
            preview(&hit.chunk.text, PREVIEW_CHARS)
        )?;
    }

    match answer {
        Some(Synthesis::Answer(text)) => writeln!(out, "\n{text}")?,
        Some(Synthesis::Unavailable(reason)) => writeln!(out, "\n[docqa] synthesis unavailable: {reason}")?,
        None => {}
    }

    if args.print_prompt {
        let results: Vec<RetrievalResult<'_>> = hits
            .iter()
            .filter_map(|hit| {
                index.chunks().get(hit.chunk.ordinal).map(|chunk| RetrievalResult {
                    chunk,
                    score: hit.score,
                    rank: hit.rank,
                })
            })
            .collect();
        writeln!(out, "\n{}", grounded_prompt(&request.question, &build_context(&results), citations))?;
    }
    Ok(())
}
