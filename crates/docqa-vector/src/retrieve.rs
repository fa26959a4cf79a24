use std::cmp::Ordering;

use docqa_core::types::Chunk;
use docqa_core::{Error, Result};

use crate::index::Index;

/// A ranked chunk borrowed from the index it was retrieved from.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
    /// 1-based.
    pub rank: usize,
}

/// Cosine similarity of `a` and `b`, accumulated in f64. Zero-norm inputs
/// score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let score = (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0) as f32;
    // -0.0 sorts below 0.0 under total_cmp
    if score == 0.0 { 0.0 } else { score }
}

/// The `top_k` chunks most similar to `query`, best first. Equal scores are
/// ordered by position in the source.
pub fn retrieve<'a>(index: &'a Index, query: &[f32], top_k: usize) -> Result<Vec<RetrievalResult<'a>>> {
    if top_k == 0 {
        return Err(Error::InvalidConfig("top_k must be greater than zero".into()));
    }
    if query.len() != index.dimension() {
        return Err(Error::IndexConfigMismatch(format!(
            "query vector has {} dimensions, index has {}",
            query.len(),
            index.dimension()
        )));
    }

    let mut scored: Vec<(usize, f32)> = index
        .vectors()
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine(query, v)))
        .collect();
    let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering { b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)) };
    let k = top_k.min(scored.len());
    if k < scored.len() {
        scored.select_nth_unstable_by(k, by_rank);
        scored.truncate(k);
    }
    scored.sort_by(by_rank);

    let chunks = index.chunks();
    let results: Vec<RetrievalResult<'a>> = scored
        .into_iter()
        .enumerate()
        .map(|(i, (pos, score))| RetrievalResult { chunk: &chunks[pos], score, rank: i + 1 })
        .collect();
    tracing::debug!(candidates = index.len(), returned = results.len(), "retrieved");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_handles_zero_and_bounds() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, -1.0]).to_bits(), 0f32.to_bits());
    }
}
