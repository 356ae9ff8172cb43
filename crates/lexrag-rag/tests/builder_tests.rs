use anyhow::anyhow;
use std::fs;
use std::path::Path;

use lexrag_core::config::Settings;
use lexrag_core::error::Error;
use lexrag_core::traits::{Embedder, VectorIndex};
use lexrag_embed::FakeEmbedder;
use lexrag_rag::{IndexBuilder, Retriever};
use lexrag_vector::PersistedIndex;

const DIM: usize = 32;

fn settings() -> Settings {
    let mut s = Settings::default();
    s.ingest.max_chars = 40;
    s.ingest.batch_size = 2;
    s
}

fn texts() -> Vec<String> {
    vec![
        "A vehicle must yield at intersections and to pedestrians on crossings.".to_string(),
        String::new(),
        "Tax filing deadline is April".to_string(),
        "   ".to_string(),
        "Anayasa madde 1: Türkiye Devleti bir Cumhuriyettir.".to_string(),
    ]
}

/// Fails on the second batch it is given.
struct FlakyEmbedder {
    inner: FakeEmbedder,
    calls: std::sync::atomic::AtomicUsize,
}

impl Embedder for FlakyEmbedder {
    fn embedder_id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 1 {
            return Err(anyhow!("out of memory"));
        }
        self.inner.embed_batch(texts)
    }
}

fn expected_chunks(settings: &Settings) -> Vec<String> {
    texts().iter().flat_map(|t| lexrag_core::chunk(t, settings.ingest.max_chars)).collect()
}

#[test]
fn build_writes_aligned_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let settings = settings();
    let embedder = FakeEmbedder::new(DIM);
    let report = IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap();

    let chunks = expected_chunks(&settings);
    assert_eq!(report.records, 5);
    assert_eq!(report.chunks, chunks.len());
    assert_eq!(report.dim, DIM);
    assert_eq!(report.ann_index, None);
    assert_eq!(report.index_dir, target);

    let opened = PersistedIndex::open(&target).unwrap();
    assert_eq!(opened.index.len(), chunks.len());
    assert_eq!(opened.metadata.len(), chunks.len());
    assert_eq!(opened.metadata.iter().map(str::to_string).collect::<Vec<_>>(), chunks);
    assert_eq!(opened.manifest.embedder_id, "fake:xxhash:d32");
    assert_eq!(opened.manifest.max_chars, 40);
    assert!(chrono::DateTime::parse_from_rfc3339(&opened.manifest.built_at).is_ok());
}

#[test]
fn built_index_serves_searches() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let mut settings = settings();
    settings.ingest.max_chars = 512;
    let embedder = FakeEmbedder::new(DIM);
    IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap();

    let PersistedIndex { index, metadata, .. } = PersistedIndex::open(&target).unwrap();
    let retriever = Retriever::new(index, metadata, Box::new(FakeEmbedder::new(DIM)), None, settings.retrieval).unwrap();
    let hits = retriever.search("Tax filing deadline is April", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "Tax filing deadline is April");
    assert!((hits[0].score - 1.0).abs() < 1e-4);
}

#[test]
fn rebuild_replaces_index() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let settings = settings();
    let embedder = FakeEmbedder::new(DIM);
    IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap();
    let report = IndexBuilder::new(&embedder, &settings).build(&["just one".to_string()], &target).unwrap();
    assert_eq!(report.chunks, 1);
    let opened = PersistedIndex::open(&target).unwrap();
    assert_eq!(opened.metadata.iter().collect::<Vec<_>>(), vec!["just one"]);
}

#[test]
fn failed_build_keeps_previous_index() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let settings = settings();
    let embedder = FakeEmbedder::new(DIM);
    let first = IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap();

    let flaky = FlakyEmbedder { inner: FakeEmbedder::new(DIM), calls: Default::default() };
    let err = IndexBuilder::new(&flaky, &settings).build(&texts(), &target).unwrap_err();
    assert!(matches!(err, Error::Build(_)));
    assert!(err.is_fatal());

    let opened = PersistedIndex::open(&target).unwrap();
    assert_eq!(opened.manifest.count, first.chunks);
    assert_eq!(opened.manifest.embedder_id, "fake:xxhash:d32");
    let entries = fs::read_dir(tmp.path()).unwrap().count();
    assert_eq!(entries, 1, "staging directory is removed after a failed build");
}

#[test]
fn limit_caps_indexed_chunks() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let mut settings = settings();
    settings.ingest.limit = Some(2);
    let embedder = FakeEmbedder::new(DIM);
    let report = IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap();
    assert_eq!(report.chunks, 2);
    assert_eq!(PersistedIndex::open(&target).unwrap().metadata.len(), 2);
}

#[test]
fn empty_corpus_builds_empty_index() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let settings = settings();
    let embedder = FakeEmbedder::new(DIM);
    let report = IndexBuilder::new(&embedder, &settings).build(&[String::new()], &target).unwrap();
    assert_eq!(report.chunks, 0);
    let PersistedIndex { index, metadata, .. } = PersistedIndex::open(&target).unwrap();
    let retriever = Retriever::new(index, metadata, Box::new(FakeEmbedder::new(DIM)), None, settings.retrieval).unwrap();
    assert!(retriever.search("anything", 5).unwrap().is_empty());
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn build_from_directory_uses_field_policy() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write(&data, "a.jsonl", "{\"Soru\": \"q1\", \"Cevap\": \"Birinci cevap\"}\nnot json\n{\"answer\": \"second answer\"}\n");
    write(&data, "b.json", "[{\"Cevap\": \"\"}, {\"body\": \"ignored\"}, {\"answer\": \"third\"}]");
    let settings = settings();
    let embedder = FakeEmbedder::new(DIM);
    let target = tmp.path().join("index");
    let report = IndexBuilder::new(&embedder, &settings).build_from_directory(&data, &target).unwrap();
    assert_eq!(report.records, 5);
    assert_eq!(report.chunks, 3);
    let opened = PersistedIndex::open(&target).unwrap();
    assert_eq!(opened.metadata.iter().collect::<Vec<_>>(), vec!["Birinci cevap", "second answer", "third"]);
}

#[test]
fn zero_batch_size_is_a_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("index");
    let mut settings = settings();
    settings.ingest.batch_size = 0;
    let embedder = FakeEmbedder::new(DIM);
    let err = IndexBuilder::new(&embedder, &settings).build(&texts(), &target).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(!target.exists(), "nothing is staged or committed");
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}
