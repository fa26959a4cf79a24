//! docqa-vector
//!
//! The in-memory `Index` (chunks, vectors and embedder state), its
//! single-file binary persistence, and cosine top-K retrieval.

pub mod index;
pub mod retrieve;
pub mod storage;

pub use index::Index;
pub use retrieve::{cosine, retrieve, RetrievalResult};
pub use storage::{load, save};
