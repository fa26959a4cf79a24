use std::hash::Hasher;

use twox_hash::XxHash64;

use docqa_core::config::HashingParams;
use docqa_core::traits::Embedder;
use docqa_core::types::{EmbedderState, EmbeddingBackend, HashingState, Vector};
use docqa_core::{Error, Result};
use docqa_text::TermAnalyzer;

const MIN_TOKEN_CHARS: usize = 1;

/// Stateless feature hashing: each token lands in `hash % dimension` with a
/// sign taken from the hash's top bit. Needs no fitting, so it also works for
/// sources too small to build a useful vocabulary.
#[derive(Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    seed: u64,
    analyzer: TermAnalyzer,
}

impl HashingEmbedder {
    pub fn new(params: &HashingParams) -> Self {
        Self { dimension: params.dimension, seed: params.seed, analyzer: TermAnalyzer::default() }
    }

    fn embed_one(&self, text: &str, state: &HashingState) -> Vector {
        let mut v = vec![0f64; state.dimension];
        for token in self.analyzer.tokens(text, MIN_TOKEN_CHARS) {
            let mut hasher = XxHash64::with_seed(state.seed);
            hasher.write(token.as_bytes());
            let h = hasher.finish();
            let idx = (h % state.dimension as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v.into_iter().map(|x| x as f32).collect()
    }
}

impl Embedder for HashingEmbedder {
    fn backend(&self) -> EmbeddingBackend {
        EmbeddingBackend::Hashing
    }

    fn fit(&self, _corpus: &[&str]) -> Result<EmbedderState> {
        if self.dimension == 0 {
            return Err(Error::InvalidConfig("hashing dimension must be greater than zero".into()));
        }
        Ok(EmbedderState::Hashing(HashingState { dimension: self.dimension, seed: self.seed }))
    }

    fn transform(&self, texts: &[&str], state: &EmbedderState) -> Result<Vec<Vector>> {
        let EmbedderState::Hashing(state) = state else {
            return Err(Error::IndexConfigMismatch(format!(
                "hashing embedder cannot use a {} state",
                state.backend()
            )));
        };
        if state.dimension == 0 {
            return Err(Error::InvalidIndex("hashing state has zero dimension".into()));
        }
        Ok(texts.iter().map(|text| self.embed_one(text, state)).collect())
    }
}
