use lexrag_core::error::Error;
use lexrag_core::traits::VectorIndex;
use lexrag_vector::FlatIndex;

fn unit(v: &[f32]) -> Vec<f32> {
    let n = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / n).collect()
}

fn sample_index() -> FlatIndex {
    let mut index = FlatIndex::new(3);
    index
        .add(&[unit(&[1.0, 0.0, 0.0]), unit(&[0.0, 1.0, 0.0]), unit(&[1.0, 1.0, 0.0]), unit(&[0.0, 0.0, 1.0])])
        .unwrap();
    index
}

#[test]
fn search_orders_by_descending_inner_product() {
    let index = sample_index();
    let hits = index.search(&unit(&[1.0, 0.2, 0.0]), 4).unwrap();
    let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 2, 1, 3]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn search_returns_min_of_k_and_size() {
    let index = sample_index();
    assert_eq!(index.search(&unit(&[1.0, 0.0, 0.0]), 2).unwrap().len(), 2);
    assert_eq!(index.search(&unit(&[1.0, 0.0, 0.0]), 50).unwrap().len(), 4);
    assert!(index.search(&unit(&[1.0, 0.0, 0.0]), 0).unwrap().is_empty());
}

#[test]
fn ties_keep_insertion_order() {
    let mut index = FlatIndex::new(2);
    index.add(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
    let hits = index.search(&[1.0, 0.0], 3).unwrap();
    assert_eq!(hits.iter().map(|h| h.position).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn dimension_mismatch_is_an_error() {
    let mut index = sample_index();
    assert!(matches!(index.search(&[1.0, 0.0], 1), Err(Error::DimensionMismatch { expected: 3, actual: 2 })));
    assert!(matches!(index.add(&[vec![1.0; 4]]), Err(Error::DimensionMismatch { expected: 3, actual: 4 })));
    assert_eq!(index.len(), 4, "failed add leaves the index unchanged");
}

#[test]
fn empty_index_returns_nothing() {
    let index = FlatIndex::new(3);
    assert!(index.is_empty());
    assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
}
