//! docqa-core
//!
//! Shared domain types, the error taxonomy, the `Embedder` seam, configuration
//! loading and source ingestion for the docqa retrieval pipeline.

pub mod config;
pub mod error;
pub mod source;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
