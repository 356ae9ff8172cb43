//! Full-rebuild index builder.
//!
//! Chunks every source text, embeds the chunks in bounded batches and streams
//! vectors and metadata into a staging directory. The staged artifacts only
//! replace the live index once every batch has been written and the
//! alignment check has passed.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use lexrag_core::chunk;
use lexrag_core::config::Settings;
use lexrag_core::error::{Error, Result};
use lexrag_core::records::{CorpusReader, FieldPolicy};
use lexrag_core::traits::Embedder;
use lexrag_core::types::l2_normalize;
use lexrag_vector::{LanceIndexWriter, Manifest, MetadataWriter, StagedBuild};

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub records: usize,
    pub chunks: usize,
    pub dim: usize,
    pub index_dir: PathBuf,
    pub ann_index: Option<String>,
}

pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    settings: &'a Settings,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder, settings: &'a Settings) -> Self {
        Self { embedder, settings }
    }

    /// Read every record under `data_dir` and rebuild the index at `index_dir`.
    pub fn build_from_directory(&self, data_dir: &Path, index_dir: &Path) -> Result<BuildReport> {
        self.settings.validate()?;
        let reader = CorpusReader::new(FieldPolicy::new(self.settings.ingest.text_fields.iter().cloned()));
        let texts = reader
            .read_directory(data_dir)
            .map_err(|e| Error::Build(format!("reading {}: {:#}", data_dir.display(), e)))?;
        self.build(&texts, index_dir)
    }

    /// Rebuild the index at `index_dir` from already extracted texts.
    pub fn build(&self, texts: &[String], index_dir: &Path) -> Result<BuildReport> {
        self.settings.validate()?;
        let ingest = &self.settings.ingest;
        let mut chunks: Vec<String> = texts.iter().flat_map(|t| chunk(t, ingest.max_chars)).collect();
        if let Some(limit) = ingest.limit {
            if chunks.len() > limit {
                info!(limit, total = chunks.len(), "limiting indexed chunks");
                chunks.truncate(limit);
            }
        }
        let dim = self.embedder.dim();
        info!(records = texts.len(), chunks = chunks.len(), dim, embedder = %self.embedder.embedder_id(), "building index");

        let staged = StagedBuild::begin(index_dir)?;
        let paths = staged.paths();
        let mut vectors_out = LanceIndexWriter::create(&paths.vectors(), dim)?;
        let mut meta_out = MetadataWriter::create(&paths.meta())?;

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        for (batch_no, batch) in chunks.chunks(ingest.batch_size).enumerate() {
            let mut vectors = self
                .embedder
                .embed_batch(batch)
                .map_err(|e| Error::Build(format!("embedding batch {}: {:#}", batch_no, e)))?;
            if vectors.len() != batch.len() {
                return Err(Error::Build(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            for v in vectors.iter_mut() {
                if v.len() != dim {
                    return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
                }
                l2_normalize(v);
            }
            vectors_out.append(&vectors)?;
            meta_out.append(batch)?;
            pb.inc(batch.len() as u64);
            debug!(batch = batch_no, size = batch.len(), "batch written");
        }
        pb.finish_with_message("embedded");

        let rows = vectors_out.rows();
        let ann_index = vectors_out.finish(self.settings.vector.ann_min_rows)?;
        let (count, meta_blake3) = meta_out.finish()?;
        if count != rows || count != chunks.len() {
            return Err(Error::Build(format!("alignment check failed: {} metadata records, {} vectors", count, rows)));
        }

        let manifest = Manifest {
            embedder_id: self.embedder.embedder_id().to_string(),
            dim,
            count,
            max_chars: ingest.max_chars,
            built_at: chrono::Utc::now().to_rfc3339(),
            meta_blake3,
            ann_index: ann_index.clone(),
        };
        manifest.write(&paths.manifest())?;
        let index_dir = staged.commit()?;

        info!(chunks = count, dir = %index_dir.display(), "index build complete");
        Ok(BuildReport { records: texts.len(), chunks: count, dim, index_dir, ann_index })
    }
}
