//! On-disk layout of a built index and the staged-build swap.
//!
//! A build writes into a hidden sibling directory of the target. `commit`
//! parks the previous artifacts aside, renames the staged ones into the
//! target and only then deletes the parked copies, so a failed build never
//! leaves the target half-written. Files in the target that are not index
//! artifacts are never touched.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use lexrag_core::error::Result;

pub const VECTORS_DIR: &str = "vectors";
pub const META_FILE: &str = "meta.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct IndexPaths {
    root: PathBuf,
}

impl IndexPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }
    pub fn vectors(&self) -> PathBuf { self.root.join(VECTORS_DIR) }
    pub fn meta(&self) -> PathBuf { self.root.join(META_FILE) }
    pub fn manifest(&self) -> PathBuf { self.root.join(MANIFEST_FILE) }
}

pub struct StagedBuild {
    staging: TempDir,
    target: PathBuf,
}

impl StagedBuild {
    pub fn begin(target: &Path) -> Result<Self> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new().prefix(".lexrag-staging-").tempdir_in(parent)?;
        info!(staging = %staging.path().display(), target = %target.display(), "staging index build");
        Ok(Self { staging, target: target.to_path_buf() })
    }

    pub fn paths(&self) -> IndexPaths {
        IndexPaths::new(self.staging.path())
    }

    /// Move the staged artifacts into the target directory.
    ///
    /// Only `vectors/`, `meta.jsonl` and `manifest.json` are replaced; any
    /// other entry in the target is left alone. The previous artifacts are
    /// parked in a sibling backup directory until every rename succeeded and
    /// are put back if one fails. The manifest moves out first and in last.
    pub fn commit(self) -> Result<PathBuf> {
        let name = self.target.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "index".to_string());
        let backup = self.target.with_file_name(format!(".{}.previous", name));
        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }
        fs::create_dir_all(&self.target)?;
        fs::create_dir_all(&backup)?;

        let mut parked: Vec<&str> = Vec::new();
        for artifact in ARTIFACTS {
            let live = self.target.join(artifact);
            if !live.exists() { continue; }
            if let Err(e) = fs::rename(&live, backup.join(artifact)) {
                restore(&self.target, &backup, &parked);
                return Err(e.into());
            }
            parked.push(artifact);
        }

        let mut placed: Vec<&str> = Vec::new();
        for artifact in ARTIFACTS.iter().rev().copied() {
            let staged = self.staging.path().join(artifact);
            if !staged.exists() { continue; }
            if let Err(e) = fs::rename(&staged, self.target.join(artifact)) {
                for done in &placed {
                    if let Err(e) = remove_path(&self.target.join(done)) {
                        warn!(artifact = %done, error = %e, "failed to remove partially committed artifact");
                    }
                }
                restore(&self.target, &backup, &parked);
                return Err(e.into());
            }
            placed.push(artifact);
        }

        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!(path = %backup.display(), error = %e, "failed to remove previous index");
        }
        info!(target = %self.target.display(), replaced = !parked.is_empty(), "index committed");
        Ok(self.target)
    }
}

/// Artifacts owned by a build, in the order they leave the target.
const ARTIFACTS: [&str; 3] = [MANIFEST_FILE, META_FILE, VECTORS_DIR];

fn restore(target: &Path, backup: &Path, parked: &[&str]) {
    for artifact in parked {
        if let Err(e) = fs::rename(backup.join(artifact), target.join(artifact)) {
            warn!(artifact = %artifact, backup = %backup.display(), error = %e, "failed to restore previous artifact");
        }
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) }
}
