//! Remote answer-generation providers.
//!
//! The provider is chosen once from `generation.provider`; a remote provider
//! without its API key is a configuration error.

use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use lexrag_core::config::{GenerationSettings, ProviderKind};
use lexrag_core::error::{Error, Result};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },

    #[error("{0} response had no text")]
    EmptyResponse(&'static str),
}

/// Produces an answer for a fully assembled prompt.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::InvalidConfig(format!("building HTTP client: {}", e)))
}

fn check_status(provider: &'static str, resp: reqwest::blocking::Response) -> std::result::Result<Value, ProviderError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(ProviderError::Status { provider, status: status.as_u16(), body });
    }
    Ok(resp.json()?)
}

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiGenerator {
    pub fn new(api_key: String, model: String, temperature: f32, timeout_secs: u64) -> Result<Self> {
        Ok(Self { client: http_client(timeout_secs)?, base_url: GEMINI_BASE_URL.to_string(), api_key, model, temperature })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Generator for GeminiGenerator {
    fn name(&self) -> &str { "gemini" }

    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });
        debug!(model = %self.model, "gemini request");
        let resp = self.client.post(&url).query(&[("key", self.api_key.as_str())]).json(&body).send()?;
        let payload = check_status("gemini", resp)?;
        gemini_text(&payload).ok_or(ProviderError::EmptyResponse("gemini"))
    }
}

/// Concatenated text parts of the first candidate.
fn gemini_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, temperature: f32, timeout_secs: u64) -> Result<Self> {
        Ok(Self { client: http_client(timeout_secs)?, base_url: OPENAI_BASE_URL.to_string(), api_key, model, temperature })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Generator for OpenAiGenerator {
    fn name(&self) -> &str { "openai" }

    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });
        debug!(model = %self.model, "openai request");
        let resp = self.client.post(&url).bearer_auth(&self.api_key).json(&body).send()?;
        let payload = check_status("openai", resp)?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or(ProviderError::EmptyResponse("openai"))
    }
}

fn require_key(key: &Option<String>, var: &str) -> Result<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidConfig(format!("{} is not set", var)))
}

/// Build the configured generator. `Ok(None)` for the `local` provider.
pub fn select_generator(settings: &GenerationSettings) -> Result<Option<Box<dyn Generator>>> {
    match settings.provider {
        ProviderKind::Gemini => {
            let key = require_key(&settings.gemini_api_key, "GEMINI_API_KEY")?;
            let g = GeminiGenerator::new(key, settings.gemini_model.clone(), settings.temperature, settings.timeout_secs)?;
            Ok(Some(Box::new(g)))
        }
        ProviderKind::OpenAi => {
            let key = require_key(&settings.openai_api_key, "OPENAI_API_KEY")?;
            let g = OpenAiGenerator::new(key, settings.openai_model.clone(), settings.temperature, settings.timeout_secs)?;
            Ok(Some(Box::new(g)))
        }
        ProviderKind::Local => Ok(None),
    }
}
