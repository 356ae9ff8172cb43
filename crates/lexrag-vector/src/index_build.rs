//! IVF-PQ training for large corpora.
//!
//! Small tables are searched exhaustively; once a build crosses the
//! configured row threshold an IVF-PQ index is trained on the `vector`
//! column with dot-product distance and checked on a small sample.

use anyhow::Result;
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray};
use futures::TryStreamExt;
use lancedb::index::{vector::IvfPqIndexBuilder, Index};
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};

use crate::schema::VECTOR_COL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfPqParams {
    pub nlist: usize,
    pub m: usize,
    pub nbits: usize,
}

pub fn compute_ivfpq_params(total_rows: usize, dim: usize) -> IvfPqParams {
    let sqrt_n = (total_rows as f64).sqrt() as usize;
    let mut nlist = (2 * sqrt_n).clamp(1, 65536);
    // Clamp nlist to be less than total_rows for tiny datasets
    if total_rows > 1 {
        nlist = nlist.min(total_rows - 1);
    } else {
        nlist = 1;
    }
    let preferred = if dim >= 1024 { 32 } else { 16 };
    let m = [preferred, 16, 8, 4, 2, 1].into_iter().find(|m| dim % m == 0).unwrap_or(1);
    IvfPqParams { nlist, m, nbits: 8 }
}

pub async fn build_ivfpq_index(table: &Table, index_name: &str, params: &IvfPqParams) -> Result<()> {
    table
        .create_index(
            &[VECTOR_COL],
            Index::IvfPq(
                IvfPqIndexBuilder::default()
                    .distance_type(DistanceType::Dot)
                    .num_partitions(params.nlist as u32)
                    .num_sub_vectors(params.m as u32),
            ),
        )
        .name(index_name.to_string())
        .execute()
        .await?;
    Ok(())
}

/// Sample up to `sample` stored vectors and check each finds at least one neighbor.
pub async fn validate_index(table: &Table, k: usize, sample: usize) -> Result<bool> {
    let mut stream = table.query().select(Select::columns(&[VECTOR_COL])).limit(sample).execute().await?;
    let mut checked = 0usize;
    let mut ok = 0usize;
    while let Some(batch) = stream.try_next().await? {
        let Some(fsl) = batch.column_by_name(VECTOR_COL).and_then(|a| a.as_any().downcast_ref::<FixedSizeListArray>()) else { continue };
        for i in 0..batch.num_rows() {
            if !fsl.is_valid(i) { continue; }
            let q = fsl.value(i).as_primitive::<arrow_array::types::Float32Type>().values().to_vec();
            checked += 1;
            let mut s = table.vector_search(q)?.distance_type(DistanceType::Dot).limit(k).execute().await?;
            if let Some(rb) = s.try_next().await? {
                if rb.num_rows() > 0 { ok += 1; }
            }
        }
    }
    Ok(checked > 0 && ok == checked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_clamped_for_small_tables() {
        assert_eq!(compute_ivfpq_params(1, 384).nlist, 1);
        assert_eq!(compute_ivfpq_params(10, 384).nlist, 6);
        assert_eq!(compute_ivfpq_params(1_000_000, 384).nlist, 2000);
    }

    #[test]
    fn sub_vectors_divide_the_dimension() {
        assert_eq!(compute_ivfpq_params(1000, 384).m, 16);
        assert_eq!(compute_ivfpq_params(1000, 1024).m, 32);
        assert_eq!(compute_ivfpq_params(1000, 100).m, 4);
        assert_eq!(compute_ivfpq_params(1000, 7).m, 1);
    }
}
