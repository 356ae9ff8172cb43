use std::fs;
use tempfile::TempDir;

use lexrag_core::chunker::{chunk, normalize_whitespace};
use lexrag_core::config::{Config, ProviderKind};
use lexrag_core::records::{CorpusReader, FieldPolicy};
use proptest::prelude::*;

proptest! {
    #[test]
    fn chunks_are_bounded_non_empty_and_concatenate_back(s in "[a-zA-Zçğış \\t\\n]{0,600}", m in 1usize..80) {
        let parts = chunk(&s, m);
        for p in &parts {
            prop_assert!(!p.is_empty());
            prop_assert!(p.chars().count() <= m);
        }
        prop_assert_eq!(parts.concat(), normalize_whitespace(&s));
    }
}

#[test]
fn empty_and_whitespace_input_yield_no_chunks() {
    assert!(chunk("", 512).is_empty());
    assert!(chunk(" \n\t ", 512).is_empty());
}

#[test]
fn read_directory_mixes_jsonl_and_json() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.jsonl"), "{\"Cevap\": \"first\"}\nnot json\n\n{\"answer\": \"second\"}\n{\"Soru\": \"only a question\"}\n").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(dir.join("nested/b.json"), "[{\"answer\": \"third\"}, {\"Cevap\": \"fourth\"}]").unwrap();
    fs::write(dir.join("ignored.txt"), "plain text").unwrap();

    let reader = CorpusReader::new(FieldPolicy::default());
    let texts = reader.read_directory(dir).expect("read");

    // malformed line skipped, record without a text field kept as empty
    assert_eq!(texts, vec!["first", "second", "", "third", "fourth"]);
}

#[test]
fn read_directory_without_records_is_empty() {
    let tmp = TempDir::new().unwrap();
    let reader = CorpusReader::new(FieldPolicy::default());
    assert!(reader.read_directory(tmp.path()).expect("read").is_empty());
}

#[test]
fn settings_merge_toml_over_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\ntop_k = 3\n\n[generation]\nprovider = \"openai\"\n\n[ingest]\ntext_fields = [\"body\"]\n",
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.retrieval.top_k, 3);
    assert_eq!(settings.retrieval.min_candidates, 20);
    assert_eq!(settings.generation.provider, ProviderKind::OpenAi);
    assert_eq!(settings.ingest.text_fields, vec!["body".to_string()]);
    assert_eq!(settings.ingest.max_chars, 512);
    assert_eq!(config.get::<usize>("ingest.batch_size").unwrap(), 256);
}

#[test]
fn zero_batch_size_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[ingest]\nbatch_size = 0\n").unwrap();
    let config = Config::load_from(tmp.path()).expect("load");
    let err = config.settings().unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("batch_size"));
}

#[test]
fn candidate_pool_widens_with_top_k() {
    let settings = lexrag_core::config::RetrievalSettings::default();
    assert_eq!(settings.candidate_pool(1), 20);
    assert_eq!(settings.candidate_pool(5), 20);
    assert_eq!(settings.candidate_pool(6), 24);
}
