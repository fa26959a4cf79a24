//! docqa-embed
//!
//! Embedding backends behind the `docqa_core::traits::Embedder` seam:
//! TF-IDF (default), feature hashing, and a local dense transformer.

pub mod dense;
pub mod device;
pub mod hashing;
pub mod pool;
pub mod tfidf;
pub mod tokenize;

use docqa_core::config::EmbeddingConfig;
use docqa_core::traits::Embedder;
use docqa_core::types::{EmbedderState, EmbeddingBackend};
use docqa_core::Result;

pub use dense::{resolve_model_dir, DenseEmbedder};
pub use device::select_device;
pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;
pub use tfidf::TfidfEmbedder;
pub use tokenize::tokenize_batch;

/// Build the embedder named by `config.backend`, for fitting a new index.
pub fn select_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    tracing::debug!(backend = %config.backend, "selecting embedder");
    match config.backend {
        EmbeddingBackend::Tfidf => Ok(Box::new(TfidfEmbedder::new(config.tfidf.clone()))),
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(&config.hashing))),
        EmbeddingBackend::Dense => load_dense(config),
    }
}

/// Build the embedder able to transform queries for an index fitted with
/// `state`. The backend always comes from the state, never from `config`;
/// `config` only supplies where to find a dense model.
pub fn embedder_for_state(state: &EmbedderState, config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match state {
        EmbedderState::Tfidf(_) => Ok(Box::new(TfidfEmbedder::default())),
        EmbedderState::Hashing(s) => Ok(Box::new(HashingEmbedder::new(&docqa_core::config::HashingParams {
            dimension: s.dimension,
            seed: s.seed,
        }))),
        EmbedderState::Dense(s) => {
            let dir = resolve_model_dir(config.dense.model_dir.as_deref())?;
            Ok(Box::new(DenseEmbedder::load(&dir, s.max_len)?))
        }
    }
}

fn load_dense(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let dir = resolve_model_dir(config.dense.model_dir.as_deref())?;
    Ok(Box::new(DenseEmbedder::load(&dir, config.dense.max_len)?))
}
