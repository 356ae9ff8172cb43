use anyhow::{anyhow, bail, Result};
use candle_core::{Device, IndexOp, Module};
use candle_nn::Linear;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

use lexrag_core::traits::Reranker;

use crate::tokenize::{load_tokenizer, tokenize_pairs};
use crate::weights::load_var_builder;

/// BERT sequence-classification checkpoint scoring `(query, passage)` pairs.
///
/// Expects the usual `bert.*`, `bert.pooler.dense` and single-output
/// `classifier` tensors. Scores are sigmoid-squashed logits.
pub struct CrossEncoderReranker {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoderReranker {
    pub fn load(model_dir: &Path, max_len: usize, device: Device) -> Result<Self> {
        info!("Loading cross-encoder from {}", model_dir.display());
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), max_len)?;
        let raw = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let labels = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("id2label")
            .and_then(|v| v.as_object().map(|m| m.len()))
            .unwrap_or(1);
        if labels != 1 {
            bail!("cross-encoder must have a single output label, found {}", labels);
        }
        let vb = load_var_builder(model_dir, &device)?;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = candle_nn::linear(config.hidden_size, config.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        info!("cross-encoder loaded");
        Ok(Self { bert, pooler, classifier, tokenizer, device })
    }
}

impl Reranker for CrossEncoderReranker {
    fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() { return Ok(vec![]); }
        let batch = tokenize_pairs(&self.tokenizer, query, candidates, &self.device)?;
        let hidden = self.bert.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        let scores = candle_nn::ops::sigmoid(&logits)?.squeeze(1)?.to_device(&Device::Cpu)?.to_vec1::<f32>()?;
        if scores.len() != candidates.len() {
            return Err(anyhow!("cross-encoder returned {} scores for {} candidates", scores.len(), candidates.len()));
        }
        Ok(scores)
    }
}
