use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

/// Token tensors for one padded batch, each `[B, T]`.
pub struct TokenBatch {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

/// Load `tokenizer.json` with truncation to `max_len` tokens. Pairs are
/// truncated longest-first so both separators survive.
pub fn load_tokenizer(path: &std::path::Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            strategy: TruncationStrategy::LongestFirst,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], device: &Device) -> Result<TokenBatch> {
    let encodings = texts
        .iter()
        .map(|t| tokenizer.encode(t.as_str(), true))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    pad_to_tensors(tokenizer, &encodings, device)
}

/// Encode `(query, candidate)` pairs for a cross-encoder.
pub fn tokenize_pairs(tokenizer: &Tokenizer, query: &str, candidates: &[String], device: &Device) -> Result<TokenBatch> {
    let encodings = candidates
        .iter()
        .map(|c| tokenizer.encode((query, c.as_str()), true))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    pad_to_tensors(tokenizer, &encodings, device)
}

fn pad_to_tensors(tokenizer: &Tokenizer, encodings: &[Encoding], device: &Device) -> Result<TokenBatch> {
    let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
    let batch = encodings.len();
    let width = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(batch * width);
    let mut types = Vec::with_capacity(batch * width);
    let mut mask = Vec::with_capacity(batch * width);
    for enc in encodings {
        let n = enc.get_ids().len();
        let pad = width - n;
        ids.extend_from_slice(enc.get_ids());
        ids.extend(std::iter::repeat(pad_id).take(pad));
        types.extend_from_slice(enc.get_type_ids());
        types.extend(std::iter::repeat(0u32).take(pad));
        mask.extend_from_slice(enc.get_attention_mask());
        mask.extend(std::iter::repeat(0u32).take(pad));
    }
    Ok(TokenBatch {
        input_ids: Tensor::from_vec(ids, (batch, width), device)?,
        token_type_ids: Tensor::from_vec(types, (batch, width), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, width), device)?,
    })
}
