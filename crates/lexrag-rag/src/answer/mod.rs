//! Answer composition on top of the retriever: prompt assembly, a remote
//! generation provider with a local fallback, and an article citation hint.
//!
//! Provider failures never reach the caller; they are logged and the local
//! answer is returned instead.

mod citation;
mod generator;
mod prompt;

pub use citation::CitationFinder;
pub use generator::{select_generator, GeminiGenerator, Generator, OpenAiGenerator, ProviderError};
pub use prompt::{format_prompt, local_answer, recent_topics, strip_local_summary, ChatTurn, Role, LOCAL_SUMMARY_PREFIX, UNKNOWN_ANSWER};

use serde::Serialize;
use tracing::{info, warn};

use lexrag_core::config::GenerationSettings;
use lexrag_core::error::{Error, Result};
use lexrag_core::traits::VectorIndex;
use lexrag_core::types::Candidate;

use crate::retriever::Retriever;

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub contexts: Vec<Candidate>,
    pub source_hint: Option<String>,
}

pub struct Answerer<VI: VectorIndex> {
    retriever: Retriever<VI>,
    generator: Option<Box<dyn Generator>>,
    citations: CitationFinder,
    topic_keywords: Vec<String>,
}

impl<VI: VectorIndex> Answerer<VI> {
    /// Pick the generator from `settings.provider`.
    pub fn new(retriever: Retriever<VI>, settings: &GenerationSettings) -> Result<Self> {
        let generator = select_generator(settings)?;
        Self::with_generator(retriever, generator, settings)
    }

    pub fn with_generator(
        retriever: Retriever<VI>,
        generator: Option<Box<dyn Generator>>,
        settings: &GenerationSettings,
    ) -> Result<Self> {
        let citations = CitationFinder::new(&settings.citation)
            .map_err(|e| Error::InvalidConfig(format!("generation.citation: {}", e)))?;
        Ok(Self { retriever, generator, citations, topic_keywords: settings.topic_keywords.clone() })
    }

    pub fn retriever(&self) -> &Retriever<VI> { &self.retriever }

    pub fn answer(&self, question: &str, top_k: usize, history: &[ChatTurn]) -> Result<Answer> {
        let contexts = self.retriever.search(question, top_k)?;
        let prompt = format_prompt(question, &contexts, history, &self.topic_keywords);
        let answer = self.generate(&prompt, &contexts);
        let source_hint = self.citations.hint(&contexts);
        Ok(Answer { question: question.to_string(), answer, contexts, source_hint })
    }

    fn generate(&self, prompt: &str, contexts: &[Candidate]) -> String {
        let Some(generator) = &self.generator else { return local_answer(contexts) };
        match generator.generate(prompt) {
            Ok(text) if !text.trim().is_empty() => {
                info!(provider = generator.name(), chars = text.len(), "answer generated");
                text
            }
            Ok(_) => {
                warn!(provider = generator.name(), "empty answer, using local summary");
                local_answer(contexts)
            }
            Err(e) => {
                warn!(provider = generator.name(), error = %e, "generation failed, using local summary");
                local_answer(contexts)
            }
        }
    }
}
