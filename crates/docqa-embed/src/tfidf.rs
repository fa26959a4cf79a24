//! TF-IDF over word uni/bi-grams.
//!
//! - terms: lowercased tokens of `min_token_chars`+ characters, expanded to
//!   n-grams in `ngram_range`
//! - vocabulary: the `max_features` most frequent terms across the corpus
//!   (ties broken lexicographically), then stored in lexicographic order
//! - idf: smoothed, `ln((1 + n) / (1 + df)) + 1`
//! - rows: raw term count times idf, L2-normalized
//!
//! A corpus with no terms at all, including one whose tokens are all shorter
//! than `min_token_chars` ("I a."), fails `fit` with an empty vocabulary.
//!
//! All weights are computed in f64 and rounded to f32 once at the end, so
//! fitting the same corpus twice yields bit-identical vectors.

use std::collections::{BTreeMap, BTreeSet};

use docqa_core::config::TfidfParams;
use docqa_core::traits::Embedder;
use docqa_core::types::{EmbedderState, EmbeddingBackend, TfidfState, Vector};
use docqa_core::{Error, Result};
use docqa_text::TermAnalyzer;

#[derive(Clone)]
pub struct TfidfEmbedder {
    params: TfidfParams,
    analyzer: TermAnalyzer,
}

impl TfidfEmbedder {
    pub fn new(params: TfidfParams) -> Self {
        Self { params, analyzer: TermAnalyzer::default() }
    }

    fn vectorize(&self, text: &str, state: &TfidfState) -> Vector {
        let mut weights = vec![0f64; state.vocabulary.len()];
        for term in self.analyzer.terms(text, state.min_token_chars, state.ngram_range) {
            if let Some(i) = state.term_index(&term) {
                weights[i] += state.idf[i];
            }
        }
        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            weights.iter_mut().for_each(|w| *w /= norm);
        }
        weights.into_iter().map(|w| w as f32).collect()
    }
}

impl Default for TfidfEmbedder {
    fn default() -> Self {
        Self::new(TfidfParams::default())
    }
}

impl Embedder for TfidfEmbedder {
    fn backend(&self) -> EmbeddingBackend {
        EmbeddingBackend::Tfidf
    }

    fn fit(&self, corpus: &[&str]) -> Result<EmbedderState> {
        let ngram_range = (self.params.ngram_min, self.params.ngram_max);
        let mut totals: BTreeMap<String, usize> = BTreeMap::new();
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let mut seen = BTreeSet::new();
            for term in self.analyzer.terms(doc, self.params.min_token_chars, ngram_range) {
                *totals.entry(term.clone()).or_default() += 1;
                seen.insert(term);
            }
            for term in seen {
                *doc_freq.entry(term).or_default() += 1;
            }
        }
        if totals.is_empty() {
            return Err(Error::embedding(
                "fit",
                format!(
                    "empty vocabulary: no terms of at least {} characters in {} documents",
                    self.params.min_token_chars,
                    corpus.len()
                ),
            ));
        }

        let mut terms: Vec<(String, usize)> = totals.into_iter().collect();
        if let Some(limit) = self.params.max_features {
            if terms.len() > limit {
                terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                terms.truncate(limit);
                terms.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        let n = corpus.len() as f64;
        let idf = terms
            .iter()
            .map(|(term, _)| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        tracing::debug!(terms = vocabulary.len(), documents = corpus.len(), "fitted tfidf vocabulary");

        Ok(EmbedderState::Tfidf(TfidfState {
            vocabulary,
            idf,
            ngram_range,
            max_features: self.params.max_features,
            min_token_chars: self.params.min_token_chars,
        }))
    }

    fn transform(&self, texts: &[&str], state: &EmbedderState) -> Result<Vec<Vector>> {
        let EmbedderState::Tfidf(state) = state else {
            return Err(Error::IndexConfigMismatch(format!(
                "tfidf embedder cannot use a {} state",
                state.backend()
            )));
        };
        Ok(texts.iter().map(|text| self.vectorize(text, state)).collect())
    }
}
