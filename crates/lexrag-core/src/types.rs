//! Domain types used by the index builder and the retriever.

use serde::{Deserialize, Serialize};

/// One line of the metadata store. Line order equals vector insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
}

/// A raw hit from the vector index: the insertion position of the vector and
/// its inner-product score against the query (higher is better).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

/// A retrieval candidate: chunk text plus a relevance score.
///
/// The score is the coarse similarity when the rerank stage did not run and
/// the cross-encoder score otherwise. Candidates are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub score: f32,
}

impl Candidate {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self { text: text.into(), score }
    }
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Inner product of two equally sized vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
