use crate::error::Result;
use crate::types::Neighbor;

/// Text embedding model. Vectors are L2-normalized and of length `dim()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `bert:paraphrase-multilingual-MiniLM-L12-v2:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Pairwise relevance model. Returns one score per candidate, same order,
/// higher is more relevant.
pub trait Reranker: Send + Sync {
    fn score(&self, query: &str, candidates: &[String]) -> anyhow::Result<Vec<f32>>;
}

/// Read side of a vector index. Implementations must be safe for concurrent
/// read-only use.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// At most `k` neighbors by descending inner product.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}
