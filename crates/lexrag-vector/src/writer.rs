use anyhow::Context;
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator};
use lancedb::{Connection, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use lexrag_core::error::{Error, Result};

use crate::index_build::{build_ivfpq_index, compute_ivfpq_params, validate_index};
use crate::schema::{build_vector_schema, TABLE_NAME};
use crate::table::{ensure_table, open_db};

pub(crate) fn store_err(e: anyhow::Error) -> Error {
	Error::Store(format!("{:#}", e))
}

/// Appends vectors to a fresh Lance table, assigning consecutive positions
/// starting at zero.
pub struct LanceIndexWriter {
	runtime: Runtime,
	conn: Connection,
	table: Option<Table>,
	dim: usize,
	rows: usize,
}

impl LanceIndexWriter {
	pub fn create(uri: &Path, dim: usize) -> Result<Self> {
		let runtime = Runtime::new()?;
		let conn = runtime.block_on(open_db(uri.to_string_lossy().as_ref())).map_err(store_err)?;
		Ok(Self { runtime, conn, table: None, dim, rows: 0 })
	}

	pub fn dim(&self) -> usize { self.dim }
	pub fn rows(&self) -> usize { self.rows }

	pub fn append(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
		if vectors.is_empty() { return Ok(()); }
		if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
			return Err(Error::DimensionMismatch { expected: self.dim, actual: bad.len() });
		}
		let batch = vectors_to_record_batch(self.rows, vectors, self.dim).map_err(store_err)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let table = self.runtime.block_on(async {
			match &self.table {
				Some(t) => { t.add(reader).execute().await?; Ok::<_, anyhow::Error>(t.clone()) }
				None => Ok(self.conn.create_table(TABLE_NAME, reader).execute().await?),
			}
		}).map_err(store_err)?;
		self.table = Some(table);
		self.rows += vectors.len();
		Ok(())
	}

	/// Finalize the table. Trains an IVF-PQ index when `rows >= ann_min_rows`
	/// and returns its name.
	pub fn finish(self, ann_min_rows: usize) -> Result<Option<String>> {
		let Self { runtime, conn, table, dim, rows } = self;
		runtime.block_on(async move {
			let table = match table {
				Some(t) => t,
				None => ensure_table(&conn, TABLE_NAME, build_vector_schema(dim)).await?,
			};
			if rows == 0 || rows < ann_min_rows {
				return Ok(None);
			}
			let params = compute_ivfpq_params(rows, dim);
			let name = format!("ivfpq-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
			info!(rows, nlist = params.nlist, m = params.m, "training IVF-PQ index");
			build_ivfpq_index(&table, &name, &params).await.context("IVF-PQ build")?;
			if !validate_index(&table, 5, 5).await? {
				warn!(index = %name, "ANN index returned empty results on sample queries");
				anyhow::bail!("ANN index {} failed validation", name);
			}
			Ok(Some(name))
		}).map_err(store_err)
	}
}

fn vectors_to_record_batch(start: usize, vectors: &[Vec<f32>], dim: usize) -> anyhow::Result<RecordBatch> {
	let schema = build_vector_schema(dim);
	let positions: Vec<i64> = (start..start + vectors.len()).map(|p| p as i64).collect();
	let items = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(Int64Array::from(positions)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(items, dim as i32)),
	])?;
	Ok(record_batch)
}
