use regex::Regex;
use serde::{Deserialize, Serialize};

use lexrag_core::types::Candidate;

const HISTORY_WINDOW: usize = 3;
const MAX_TOPICS: usize = 5;
const FALLBACK_CHARS: usize = 800;

pub const LOCAL_SUMMARY_PREFIX: &str = "(Local summary)";
pub const UNKNOWN_ANSWER: &str = "I don't know.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
    pub fn assistant(content: impl Into<String>) -> Self { Self { role: Role::Assistant, content: content.into() } }
}

/// Keywords mentioned in the assistant turns among the last few turns,
/// first-seen order, deduplicated.
pub fn recent_topics(history: &[ChatTurn], keywords: &[String]) -> Vec<String> {
    if history.len() < 2 || keywords.is_empty() {
        return vec![];
    }
    let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(&k.to_lowercase())).collect();
    let Ok(re) = Regex::new(&format!(r"\b({})\b", alternatives.join("|"))) else { return vec![] };
    let mut topics: Vec<String> = Vec::new();
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for turn in history[start..].iter().filter(|t| t.role == Role::Assistant) {
        let text = turn.content.to_lowercase();
        for m in re.find_iter(&text) {
            if !topics.iter().any(|t| t == m.as_str()) {
                topics.push(m.as_str().to_string());
            }
        }
    }
    topics.truncate(MAX_TOPICS);
    topics
}

pub fn format_prompt(question: &str, contexts: &[Candidate], history: &[ChatTurn], keywords: &[String]) -> String {
    let context_block = contexts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Passage {} | similarity={:.3}]\n{}", i + 1, c.score, c.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    let topics = recent_topics(history, keywords);
    let history_line = if topics.is_empty() {
        String::new()
    } else {
        format!("\n\nEarlier conversation topics: {}", topics.join(", "))
    };
    let system = "You are a legal assistant. Answer briefly and accurately, in the language of the question. \
        Rely only on the information in CONTEXT and add nothing from outside it. \
        Do not assume article or statute numbers that CONTEXT does not state explicitly. \
        If the question is outside CONTEXT, say that you don't know.";
    format!(
        "{system}{history_line}\n\nQuestion: {question}\n\nContext (question/answer passages):\n{context_block}\n\nAnswer (at most 4-5 sentences):"
    )
}

/// Answer composed from the retrieved passages alone, used when no remote
/// provider produced one.
pub fn local_answer(contexts: &[Candidate]) -> String {
    if contexts.is_empty() {
        return UNKNOWN_ANSWER.to_string();
    }
    let joined = contexts.iter().take(2).map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    let summary = match joined.char_indices().nth(FALLBACK_CHARS) {
        Some((cut, _)) => format!("{}...", &joined[..cut]),
        None => joined,
    };
    format!("{LOCAL_SUMMARY_PREFIX} Drawn from the retrieved context:\n{summary}")
}

/// Text of an answer suitable for display: drops the local-summary notice
/// line and any echoed `Question:` / `Answer:` lines.
pub fn strip_local_summary(answer: &str) -> String {
    if answer.trim_start().starts_with(LOCAL_SUMMARY_PREFIX) {
        return answer.trim_start().split_once('\n').map(|(_, rest)| rest.trim().to_string()).unwrap_or_default();
    }
    answer
        .lines()
        .filter(|l| {
            let l = l.trim_start();
            !(l.starts_with("Question:") || l.starts_with("Answer:"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
