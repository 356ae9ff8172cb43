use lexrag_core::error::{Error, Result};
use lexrag_core::traits::VectorIndex;
use lexrag_core::types::{dot, Neighbor};

/// Exact in-memory inner-product index.
///
/// Vectors are stored contiguously in insertion order; position `i` is the
/// `i`-th vector added.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize { self.dim }

    fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if k == 0 || self.is_empty() {
            return Ok(vec![]);
        }
        let mut hits: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, v)| Neighbor { position, score: dot(query, v) })
            .collect();
        // stable: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}
