use lexrag_core::traits::VectorIndex;
use lexrag_vector::{LanceIndexWriter, LanceVectorIndex};

/// Slow test that trains a real IVF-PQ index.
/// Ignored by default to keep CI fast; run explicitly when needed:
/// `cargo test -p lexrag-vector --test ann_tests -- --ignored`
#[ignore]
#[test]
fn ivfpq_index_builds_and_serves() {
    let tmp = tempfile::tempdir().unwrap();
    let uri = tmp.path().join("vectors");
    let dim = 32usize;
    let n = 600usize;
    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|i| {
            let mut v: Vec<f32> = (0..dim).map(|d| (((i * 31 + d * 7) % 97) as f32) / 97.0).collect();
            lexrag_core::types::l2_normalize(&mut v);
            v
        })
        .collect();
    let mut writer = LanceIndexWriter::create(&uri, dim).unwrap();
    for batch in vectors.chunks(128) {
        writer.append(batch).unwrap();
    }
    let ann = writer.finish(256).unwrap();
    assert!(ann.is_some());

    let index = LanceVectorIndex::open(&uri).unwrap();
    assert_eq!(index.len(), n);
    let hits = index.search(&vectors[10], 5).unwrap();
    assert!(!hits.is_empty() && hits.len() <= 5);
}
