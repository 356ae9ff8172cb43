//! Source-record ingestion.
//!
//! Records are JSON objects stored either one per line in `*.jsonl` files or
//! as an object / array of objects in `*.json` files. Schemas vary between
//! datasets, so the answer text is picked by an ordered field policy and
//! missing fields are treated as empty text.

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ordered list of candidate field names; the first non-empty string wins.
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    fields: Vec<String>,
}

impl FieldPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Extract the trimmed text of the first matching field, or `""`.
    pub fn extract(&self, record: &Value) -> String {
        for name in &self.fields {
            if let Some(s) = record.get(name).and_then(Value::as_str) {
                let s = s.trim();
                if !s.is_empty() {
                    return s.to_string();
                }
            }
        }
        String::new()
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self::new(["Cevap", "answer"])
    }
}

pub struct CorpusReader {
    policy: FieldPolicy,
}

impl CorpusReader {
    pub fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    /// Read every record under `data_dir` and return the extracted texts in
    /// file-name order, then record order. Empty extractions are kept so the
    /// caller sees one entry per record; the chunker drops them.
    pub fn read_directory(&self, data_dir: &Path) -> Result<Vec<String>> {
        let files = self.list_record_files(data_dir);
        if files.is_empty() {
            warn!(dir = %data_dir.display(), "no .jsonl or .json files found");
            return Ok(vec![]);
        }
        let mut texts = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            info!("Reading file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let before = texts.len();
            self.read_file(file_path, &mut texts)?;
            info!(records = texts.len() - before, "file done");
        }
        info!("Read {} records from {} files", texts.len(), files.len());
        Ok(texts)
    }

    /// Read a single `.jsonl` or `.json` file.
    pub fn read_file(&self, file_path: &Path, out: &mut Vec<String>) -> Result<()> {
        let content = match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(file_path)?).to_string(),
        };
        if file_path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() { continue; }
                match serde_json::from_str::<Value>(line) {
                    Ok(record) => out.push(self.policy.extract(&record)),
                    Err(e) => warn!(file = %file_path.display(), line = line_no + 1, error = %e, "skipping malformed record"),
                }
            }
        } else {
            match serde_json::from_str::<Value>(&content)? {
                Value::Array(records) => out.extend(records.iter().map(|r| self.policy.extract(r))),
                record => out.push(self.policy.extract(&record)),
            }
        }
        Ok(())
    }

    fn list_record_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if matches!(path.extension().and_then(|s| s.to_str()), Some("jsonl") | Some("json")) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}
