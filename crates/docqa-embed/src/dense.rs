//! Dense sentence embeddings from a local XLM-RoBERTa checkpoint (BGE-M3 and
//! relatives). Expects `tokenizer.json`, `config.json` and
//! `pytorch_model.bin` in the model directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docqa_core::traits::Embedder;
use docqa_core::types::{DenseState, EmbedderState, EmbeddingBackend, Vector};
use docqa_core::{Error, Result};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

/// Texts per forward pass.
const BATCH_SIZE: usize = 8;

pub struct DenseEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
    max_len: usize,
}

impl DenseEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(Error::InvalidConfig("dense max_len must be greater than zero".into()));
        }
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading dense model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::embedding("load", format!("tokenizer {}: {e}", tokenizer_path.display()))
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::embedding("load", format!("{}: {e}", config_path.display())))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::embedding("load", format!("{}: {e}", config_path.display())))?;
        let dimension = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(serde_json::Value::as_u64))
            .ok_or_else(|| Error::embedding("load", "config.json has no hidden_size"))?
            as usize;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)
            .map_err(|e| Error::embedding("load", format!("{}: {e}", weights_path.display())))?
            .into_iter()
            .collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb).map_err(|e| Error::embedding("load", e))?;

        let model_id = model_id(model_dir, dimension)?;
        tracing::info!(%model_id, "dense model ready");
        Ok(Self { model, tokenizer, device, model_id, dimension, max_len })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((texts.len(), self.max_len), DType::I64, &self.device)
            .map_err(|e| Error::embedding("forward", e))?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(|e| Error::embedding("forward", e))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec2())
            .map_err(|e| Error::embedding("pool", e))?;
        if let Some(row) = rows.iter().find(|row| row.len() != self.dimension) {
            return Err(Error::embedding("pool", format!("expected {} dims, got {}", self.dimension, row.len())));
        }
        tracing::debug!(texts = texts.len(), ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(rows)
    }
}

impl Embedder for DenseEmbedder {
    fn backend(&self) -> EmbeddingBackend {
        EmbeddingBackend::Dense
    }

    fn fit(&self, _corpus: &[&str]) -> Result<EmbedderState> {
        Ok(EmbedderState::Dense(DenseState {
            model_id: self.model_id.clone(),
            dimension: self.dimension,
            max_len: self.max_len,
        }))
    }

    fn transform(&self, texts: &[&str], state: &EmbedderState) -> Result<Vec<Vector>> {
        let EmbedderState::Dense(state) = state else {
            return Err(Error::IndexConfigMismatch(format!(
                "dense embedder cannot use a {} state",
                state.backend()
            )));
        };
        if state.model_id != self.model_id || state.dimension != self.dimension {
            return Err(Error::IndexConfigMismatch(format!(
                "index was embedded with '{}' but '{}' is loaded",
                state.model_id, self.model_id
            )));
        }
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch)?);
        }
        Ok(vectors)
    }
}

/// Identity recorded in the index: the canonical model directory and the
/// hidden size, so the same model reached through another relative path
/// still matches.
fn model_id(model_dir: &Path, dimension: usize) -> Result<String> {
    let dir = canonical(model_dir)?;
    Ok(format!("xlm-roberta:{}:d{dimension}", dir.display()))
}

fn canonical(dir: &Path) -> Result<PathBuf> {
    dir.canonicalize()
        .map_err(|e| Error::InvalidConfig(format!("dense model dir {}: {e}", dir.display())))
}

/// Locate the model directory: explicit setting first, then the
/// conventional `models/bge-m3` next to or above the working directory.
/// The result is canonical.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        if dir.exists() {
            return canonical(dir);
        }
        return Err(Error::InvalidConfig(format!("dense model dir {} does not exist", dir.display())));
    }
    let found = ["models/bge-m3", "../models/bge-m3"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            Error::InvalidConfig("no dense model dir configured (set embedding.dense.model_dir)".into())
        })?;
    canonical(&found)
}
