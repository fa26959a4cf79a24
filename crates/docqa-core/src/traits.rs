use crate::error::Result;
use crate::types::{EmbedderState, EmbeddingBackend, Vector};

/// An embedding backend split into a corpus-level `fit` and a per-text
/// `transform`, so queries can be embedded later with the state that was
/// stored in the index.
pub trait Embedder: Send + Sync {
    fn backend(&self) -> EmbeddingBackend;

    /// Learn whatever the backend needs from the full chunk set of one source.
    fn fit(&self, corpus: &[&str]) -> Result<EmbedderState>;

    /// Embed `texts` under a previously fitted `state`. Terms the state does
    /// not know contribute nothing.
    fn transform(&self, texts: &[&str], state: &EmbedderState) -> Result<Vec<Vector>>;

    fn fit_transform(&self, corpus: &[&str]) -> Result<(EmbedderState, Vec<Vector>)> {
        let state = self.fit(corpus)?;
        let vectors = self.transform(corpus, &state)?;
        Ok((state, vectors))
    }
}
