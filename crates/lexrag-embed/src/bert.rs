use anyhow::{anyhow, Result};
use candle_core::{DType, Device};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use lexrag_core::traits::Embedder;

use crate::pool::masked_mean_l2;
use crate::tokenize::{load_tokenizer, tokenize_batch};
use crate::weights::load_var_builder;

/// Texts per forward pass; the caller's batch is split into these.
const FORWARD_BATCH: usize = 32;

/// Sentence-transformers style BERT encoder with mean pooling.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, model_name: &str, max_len: usize, device: Device) -> Result<Self> {
        info!("Loading embedding model {} from {}", model_name, model_dir.display());
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Invalid model config {}: {}", config_path.display(), e))?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        let id = format!("bert:{}:d{}", model_name, dim);
        info!(dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }

    fn embed_forward(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch = tokenize_batch(&self.tokenizer, texts, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask.to_dtype(DType::F32)?)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?)
    }
}

impl Embedder for BertEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for part in texts.chunks(FORWARD_BATCH) {
            out.extend(self.embed_forward(part)?);
        }
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}
