use lexrag_core::config::{GenerationSettings, ProviderKind, RetrievalSettings};
use lexrag_embed::FakeEmbedder;
use lexrag_rag::answer::{Generator, ProviderError, LOCAL_SUMMARY_PREFIX, UNKNOWN_ANSWER};
use lexrag_rag::{Answerer, ChatTurn, Retriever};
use lexrag_vector::{FlatIndex, MetadataStore};

const DIM: usize = 64;

fn retriever(texts: &[&str]) -> Retriever<FlatIndex> {
    let embedder = FakeEmbedder::new(DIM);
    let mut index = FlatIndex::new(DIM);
    index.add(&texts.iter().map(|t| embedder.embed_text(t)).collect::<Vec<_>>()).unwrap();
    let metadata = MetadataStore::from_texts(texts.iter().map(|t| t.to_string()).collect());
    Retriever::new(index, metadata, Box::new(embedder), None, RetrievalSettings::default()).unwrap()
}

fn local_settings() -> GenerationSettings {
    GenerationSettings { provider: ProviderKind::Local, ..Default::default() }
}

struct Echo(std::sync::Mutex<Option<String>>);

impl Generator for Echo {
    fn name(&self) -> &str { "echo" }
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        *self.0.lock().unwrap() = Some(prompt.to_string());
        Ok("Cumhuriyettir.".to_string())
    }
}

struct Down;

impl Generator for Down {
    fn name(&self) -> &str { "down" }
    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::EmptyResponse("down"))
    }
}

const CORPUS: [&str; 2] = ["Anayasa 1. madde: Türkiye Devleti bir Cumhuriyettir.", "Vergi beyannamesi Mart ayında verilir."];

#[test]
fn local_provider_summarises_contexts() {
    let answerer = Answerer::new(retriever(&CORPUS), &local_settings()).unwrap();
    let out = answerer.answer("Türkiye Devleti nedir?", 2, &[]).unwrap();
    assert_eq!(out.question, "Türkiye Devleti nedir?");
    assert_eq!(out.contexts.len(), 2);
    assert!(out.answer.starts_with(LOCAL_SUMMARY_PREFIX));
    assert_eq!(out.source_hint.as_deref(), Some("Anayasa madde 1"));
}

#[test]
fn empty_index_answers_unknown() {
    let answerer = Answerer::new(retriever(&[]), &local_settings()).unwrap();
    let out = answerer.answer("anything", 3, &[]).unwrap();
    assert_eq!(out.answer, UNKNOWN_ANSWER);
    assert!(out.contexts.is_empty());
    assert_eq!(out.source_hint, None);
}

#[test]
fn generator_receives_prompt_with_topics() {
    let echo = std::sync::Arc::new(Echo(std::sync::Mutex::new(None)));
    struct Shared(std::sync::Arc<Echo>);
    impl Generator for Shared {
        fn name(&self) -> &str { "shared" }
        fn generate(&self, prompt: &str) -> Result<String, ProviderError> { self.0.generate(prompt) }
    }
    let answerer = Answerer::with_generator(retriever(&CORPUS), Some(Box::new(Shared(echo.clone()))), &local_settings()).unwrap();
    let history = vec![ChatTurn::user("merhaba"), ChatTurn::assistant("Anayasa hakkında soru sorabilirsiniz.")];
    let out = answerer.answer("Devlet nedir?", 1, &history).unwrap();
    assert_eq!(out.answer, "Cumhuriyettir.");
    let prompt = echo.0.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Earlier conversation topics: anayasa"));
    assert!(prompt.contains("Question: Devlet nedir?"));
    assert!(prompt.contains("[Passage 1 | similarity="));
}

#[test]
fn provider_failure_falls_back_to_local_answer() {
    let answerer = Answerer::with_generator(retriever(&CORPUS), Some(Box::new(Down)), &local_settings()).unwrap();
    let out = answerer.answer("vergi", 1, &[]).unwrap();
    assert!(out.answer.starts_with(LOCAL_SUMMARY_PREFIX));
    assert_eq!(out.contexts.len(), 1);
}
