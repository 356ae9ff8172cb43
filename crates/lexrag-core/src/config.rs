//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge compiled defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys) + the raw provider API key
//! variables. Provides helpers to expand `~` and `${VAR}` and to resolve
//! relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and the environment-specific overlay from `dir`.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY", "OPENAI_API_KEY"])
                    .map(|key| format!("generation.{}", key.as_str().to_ascii_lowercase()).into()),
            );

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full typed settings tree.
    pub fn settings(&self) -> crate::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let fake: bool = self.get("embedding.use_fake").unwrap_or(false);
                if fake {
                    anyhow::bail!("embedding.use_fake must not be enabled in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// Process-wide settings, read once at start-up and passed by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub vector: VectorSettings,
    pub retrieval: RetrievalSettings,
    pub reranker: RerankerSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.ingest.max_chars == 0 {
            return Err(Error::InvalidConfig("ingest.max_chars must be positive".into()));
        }
        if self.ingest.batch_size == 0 {
            return Err(Error::InvalidConfig("ingest.batch_size must be positive".into()));
        }
        if self.ingest.text_fields.is_empty() {
            return Err(Error::InvalidConfig("ingest.text_fields must name at least one field".into()));
        }
        if self.retrieval.widen_factor == 0 {
            return Err(Error::InvalidConfig("retrieval.widen_factor must be positive".into()));
        }
        Ok(())
    }

    pub fn index_dir(&self) -> PathBuf {
        expand_path(&self.storage.index_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.ingest.data_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding `vectors/`, `meta.jsonl` and `manifest.json`.
    pub index_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { index_dir: "storage/index".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub data_dir: String,
    /// Candidate field names, tried in order; first non-empty string wins.
    pub text_fields: Vec<String>,
    pub max_chars: usize,
    pub batch_size: usize,
    /// Optional cap on the number of chunks indexed.
    pub limit: Option<usize>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_dir: "data/records".to_string(),
            text_fields: vec!["Cevap".to_string(), "answer".to_string()],
            max_chars: 512,
            batch_size: 256,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_name: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_name: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            model_dir: None,
            max_len: 256,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    /// Below this many rows search is exact and no ANN index is trained.
    pub ann_min_rows: usize,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self { ann_min_rows: 100_000 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_candidates: usize,
    pub widen_factor: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5, min_candidates: 20, widen_factor: 4 }
    }
}

impl RetrievalSettings {
    /// Size of the coarse candidate pool: `max(min_candidates, widen_factor * top_k)`.
    pub fn candidate_pool(&self, top_k: usize) -> usize {
        self.min_candidates.max(self.widen_factor.saturating_mul(top_k))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    pub enabled: bool,
    pub model_name: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_name: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            model_dir: None,
            max_len: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: ProviderKind,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Words picked out of recent assistant turns to hint the conversation topic.
    pub topic_keywords: Vec<String>,
    pub citation: CitationSettings,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            gemini_api_key: None,
            openai_api_key: None,
            gemini_model: "gemini-1.5-flash".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            topic_keywords: [
                "anayasa", "madde", "kanun", "devrim", "türkiye", "cumhuriyet", "hukuk", "yasa", "mevzuat",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            citation: CitationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationSettings {
    /// Word that precedes or follows an article number, e.g. `madde 3` / `3. madde`.
    pub article_word: String,
    /// Label prepended to the hint, e.g. `Anayasa madde 3`.
    pub source_label: String,
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self { article_word: "madde".to_string(), source_label: "Anayasa".to_string() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
