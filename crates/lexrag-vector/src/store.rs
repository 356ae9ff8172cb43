use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Int64Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::path::Path;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use lexrag_core::error::{Error, Result};
use lexrag_core::traits::VectorIndex;
use lexrag_core::types::{dot, Neighbor};

use crate::artifacts::IndexPaths;
use crate::manifest::Manifest;
use crate::metadata::{digest_file, MetadataStore};
use crate::schema::{vector_dim, POSITION_COL, TABLE_NAME, VECTOR_COL};
use crate::table::open_db;
use crate::writer::store_err;

/// Read-only handle on a persisted Lance vector table.
///
/// Scores are recomputed as exact inner products on the returned vectors, so
/// results do not depend on the backend's distance convention.
pub struct LanceVectorIndex {
	runtime: Runtime,
	table: Table,
	dim: usize,
	rows: usize,
}

impl LanceVectorIndex {
	pub fn open(uri: &Path) -> Result<Self> {
		let runtime = Runtime::new()?;
		let (table, dim, rows) = runtime.block_on(async {
			let conn = open_db(uri.to_string_lossy().as_ref()).await?;
			let table = conn.open_table(TABLE_NAME).execute().await?;
			let rows = table.count_rows(None).await?;
			let schema = table.schema().await?;
			let dim = vector_dim(&schema).ok_or_else(|| anyhow::anyhow!("table {} has no fixed-size vector column", TABLE_NAME))?;
			Ok::<_, anyhow::Error>((table, dim, rows))
		}).map_err(store_err)?;
		Ok(Self { runtime, table, dim, rows })
	}

	async fn search_async(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
		let mut stream = self.table
			.vector_search(query.to_vec())?
			.distance_type(DistanceType::Dot)
			.limit(k)
			.select(Select::columns(&[POSITION_COL, VECTOR_COL]))
			.execute()
			.await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let positions = batch.column_by_name(POSITION_COL).and_then(|c| c.as_any().downcast_ref::<Int64Array>()).ok_or_else(|| anyhow::anyhow!("missing {} column", POSITION_COL))?;
			let vectors = batch.column_by_name(VECTOR_COL).and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>()).ok_or_else(|| anyhow::anyhow!("missing {} column", VECTOR_COL))?;
			for i in 0..batch.num_rows() {
				if !vectors.is_valid(i) { continue; }
				// negative ids cannot address a metadata line
				let Ok(position) = usize::try_from(positions.value(i)) else { continue };
				let v = vectors.value(i);
				let score = dot(query, v.as_primitive::<arrow_array::types::Float32Type>().values());
				hits.push(Neighbor { position, score });
			}
		}
		Ok(hits)
	}
}

impl VectorIndex for LanceVectorIndex {
	fn dim(&self) -> usize { self.dim }
	fn len(&self) -> usize { self.rows }

	fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
		}
		if k == 0 || self.rows == 0 {
			return Ok(vec![]);
		}
		let mut hits = self.runtime.block_on(self.search_async(query, k)).map_err(store_err)?;
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
		hits.truncate(k);
		debug!(k, returned = hits.len(), "vector search");
		Ok(hits)
	}
}

/// A persisted index opened for serving: vectors, aligned metadata and the
/// manifest they were built with.
pub struct PersistedIndex {
	pub index: LanceVectorIndex,
	pub metadata: MetadataStore,
	pub manifest: Manifest,
}

impl PersistedIndex {
	/// Open and cross-check all three artifacts under `dir`.
	pub fn open(dir: &Path) -> Result<Self> {
		let paths = IndexPaths::new(dir);
		let manifest = Manifest::read(&paths.manifest())?;
		let digest = digest_file(&paths.meta())?;
		if digest != manifest.meta_blake3 {
			return Err(Error::Corrupt(format!("{} does not match the manifest digest", paths.meta().display())));
		}
		let metadata = MetadataStore::load(&paths.meta())?;
		let index = LanceVectorIndex::open(&paths.vectors())?;
		if metadata.len() != index.len() || index.len() != manifest.count {
			return Err(Error::Corrupt(format!(
				"metadata has {} records, vector table {} rows, manifest {}",
				metadata.len(), index.len(), manifest.count
			)));
		}
		if index.dim() != manifest.dim {
			return Err(Error::Corrupt(format!("vector table is {}-d, manifest says {}", index.dim(), manifest.dim)));
		}
		info!(dir = %dir.display(), chunks = manifest.count, dim = manifest.dim, embedder = %manifest.embedder_id, "index loaded");
		Ok(Self { index, metadata, manifest })
	}
}
