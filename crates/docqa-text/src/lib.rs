//! docqa-text
//!
//! Text normalization, per-language sentence splitting, sentence-aware
//! chunking with word overlap, and the tantivy-backed term analyzer used by
//! the sparse embedders.

pub mod analyzer;
pub mod chunker;
pub mod normalize;
pub mod splitter;

pub use analyzer::TermAnalyzer;
pub use chunker::{chunk, Chunker};
pub use normalize::{fold_persian, normalize_whitespace};
#[cfg(feature = "segmentation")]
pub use splitter::SegmentationSplitter;
pub use splitter::{splitter_by_name, splitter_for, PunctuationSplitter, SentenceSplitter};
