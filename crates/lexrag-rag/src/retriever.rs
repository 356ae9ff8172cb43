//! Two-stage retrieval: coarse vector search, then cross-encoder rerank with
//! a silent fallback to coarse order.

use std::path::Path;
use tracing::{debug, info, warn};

use lexrag_core::config::{RetrievalSettings, Settings};
use lexrag_core::error::{Error, Result};
use lexrag_core::traits::{Embedder, Reranker, VectorIndex};
use lexrag_core::types::{l2_normalize, Candidate};
use lexrag_vector::{LanceVectorIndex, MetadataStore, PersistedIndex};

/// Outcome of the rerank stage. Only visible through
/// [`Retriever::search_with_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RerankStatus {
    Applied,
    /// No reranker configured, or nothing to rerank.
    Skipped,
    /// The reranker failed; coarse order was kept.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    pub contexts: Vec<Candidate>,
    pub rerank: RerankStatus,
}

pub struct Retriever<VI: VectorIndex> {
    index: VI,
    metadata: MetadataStore,
    embedder: Box<dyn Embedder>,
    reranker: Option<Box<dyn Reranker>>,
    settings: RetrievalSettings,
}

impl<VI: VectorIndex> Retriever<VI> {
    pub fn new(
        index: VI,
        metadata: MetadataStore,
        embedder: Box<dyn Embedder>,
        reranker: Option<Box<dyn Reranker>>,
        settings: RetrievalSettings,
    ) -> Result<Self> {
        if metadata.len() != index.len() {
            return Err(Error::Corrupt(format!(
                "metadata has {} records but the index holds {} vectors",
                metadata.len(),
                index.len()
            )));
        }
        if embedder.dim() != index.dim() {
            return Err(Error::DimensionMismatch { expected: index.dim(), actual: embedder.dim() });
        }
        Ok(Self { index, metadata, embedder, reranker, settings })
    }

    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
    pub fn has_reranker(&self) -> bool { self.reranker.is_some() }

    /// Best `top_k` chunks for `query`, best first. `top_k == 0` yields nothing.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        Ok(self.search_with_status(query, top_k)?.contexts)
    }

    pub fn search_with_status(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        if top_k == 0 || self.index.is_empty() {
            return Ok(Retrieval { contexts: vec![], rerank: RerankStatus::Skipped });
        }
        let query_vec = self.embed_query(query)?;
        let base_k = self.settings.candidate_pool(top_k);
        let hits = self.index.search(&query_vec, base_k)?;
        let mut candidates: Vec<Candidate> = hits
            .iter()
            .filter_map(|h| self.metadata.get(h.position).map(|text| Candidate::new(text, h.score)))
            .collect();
        debug!(base_k, hits = hits.len(), candidates = candidates.len(), "coarse stage");

        let rerank = self.rerank(query, &mut candidates);
        if let RerankStatus::Failed(reason) = &rerank {
            warn!(reason = %reason, "rerank failed, keeping coarse order");
        }
        candidates.truncate(top_k);
        Ok(Retrieval { contexts: candidates, rerank })
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::Embedding(format!("{:#}", e)))?;
        let mut v = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector for the query".into()))?;
        l2_normalize(&mut v);
        Ok(v)
    }

    /// Reorder `candidates` in place by reranker score. On failure the slice
    /// is left untouched.
    fn rerank(&self, query: &str, candidates: &mut [Candidate]) -> RerankStatus {
        let Some(reranker) = &self.reranker else { return RerankStatus::Skipped };
        if candidates.is_empty() {
            return RerankStatus::Skipped;
        }
        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let scores = match reranker.score(query, &texts) {
            Ok(scores) => scores,
            Err(e) => return RerankStatus::Failed(format!("{:#}", e)),
        };
        if scores.len() != candidates.len() {
            return RerankStatus::Failed(format!("{} scores for {} candidates", scores.len(), candidates.len()));
        }
        for (c, s) in candidates.iter_mut().zip(scores) {
            c.score = s;
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        RerankStatus::Applied
    }
}

/// Open the persisted index under `settings.storage.index_dir` together with
/// the configured embedder and reranker.
///
/// A reranker that fails to load is logged and left out; retrieval then
/// always uses coarse order.
pub fn open_retriever(settings: &Settings) -> Result<Retriever<LanceVectorIndex>> {
    open_retriever_at(settings, &settings.index_dir())
}

pub fn open_retriever_at(settings: &Settings, index_dir: &Path) -> Result<Retriever<LanceVectorIndex>> {
    let PersistedIndex { index, metadata, manifest } = PersistedIndex::open(index_dir)?;
    let embedder = lexrag_embed::get_default_embedder(&settings.embedding)
        .map_err(|e| Error::InvalidConfig(format!("loading embedder: {:#}", e)))?;
    if embedder.embedder_id() != manifest.embedder_id {
        warn!(index = %manifest.embedder_id, query = %embedder.embedder_id(), "query embedder differs from the one the index was built with");
    }
    let reranker = match lexrag_embed::load_reranker(&settings.reranker) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "reranker unavailable, using coarse order");
            None
        }
    };
    info!(chunks = index.len(), reranker = reranker.is_some(), "retriever ready");
    Retriever::new(index, metadata, embedder, reranker, settings.retrieval)
}
