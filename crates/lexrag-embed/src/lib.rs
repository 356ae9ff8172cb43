//! lexrag-embed
//!
//! Local candle models behind the `Embedder` and `Reranker` traits: a BERT
//! sentence encoder, a BERT cross-encoder, and a hashing fake embedder.

use anyhow::Result;
use tracing::info;

use lexrag_core::config::{EmbeddingSettings, RerankerSettings};
use lexrag_core::traits::{Embedder, Reranker};

pub mod bert;
pub mod cross_encoder;
pub mod device;
pub mod fake;
pub mod pool;
pub mod tokenize;
pub mod weights;

pub use bert::BertEmbedder;
pub use cross_encoder::CrossEncoderReranker;
pub use fake::FakeEmbedder;
pub use pool::masked_mean_l2;

/// Dimensionality of the fake embedder, matching MiniLM-L12.
pub const FAKE_DIM: usize = 384;

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if fake_requested(settings) {
        info!("Using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(FAKE_DIM)));
    }
    let dir = weights::resolve_model_dir(settings.model_dir.as_deref(), "APP_MODEL_DIR", &settings.model_name)?;
    Ok(Box::new(BertEmbedder::load(&dir, &settings.model_name, settings.max_len, device::select_device())?))
}

/// Load the configured cross-encoder. `Ok(None)` when reranking is disabled.
pub fn load_reranker(settings: &RerankerSettings) -> Result<Option<Box<dyn Reranker>>> {
    if !settings.enabled {
        info!("Reranker disabled");
        return Ok(None);
    }
    let dir = weights::resolve_model_dir(settings.model_dir.as_deref(), "APP_RERANKER_DIR", &settings.model_name)?;
    Ok(Some(Box::new(CrossEncoderReranker::load(&dir, settings.max_len, device::select_device())?)))
}
