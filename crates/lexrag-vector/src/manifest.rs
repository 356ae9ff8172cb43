use serde::{Deserialize, Serialize};
use std::path::Path;

use lexrag_core::error::{Error, Result};

/// Build provenance written next to the index artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub embedder_id: String,
    pub dim: usize,
    pub count: usize,
    pub max_chars: usize,
    /// RFC 3339 UTC timestamp.
    pub built_at: String,
    pub meta_blake3: String,
    /// Name of the trained ANN index, when one was built.
    #[serde(default)]
    pub ann_index: Option<String>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("no index manifest at {}", path.display())));
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::Corrupt(format!("{}: {}", path.display(), e)))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
