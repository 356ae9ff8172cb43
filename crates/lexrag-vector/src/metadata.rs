//! Append-only metadata store: `meta.jsonl`, one `{"text": ...}` per chunk.
//!
//! Line `n` describes the vector inserted at position `n`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use lexrag_core::error::{Error, Result};
use lexrag_core::types::ChunkRecord;

#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    texts: Vec<String>,
}

impl MetadataStore {
    pub fn from_texts(texts: Vec<String>) -> Self {
        Self { texts }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut texts = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let record: ChunkRecord = serde_json::from_str(&line).map_err(|e| {
                Error::Corrupt(format!("{} line {}: {}", path.display(), line_no + 1, e))
            })?;
            texts.push(record.text);
        }
        Ok(Self { texts })
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }
}

/// Streams records to disk while hashing exactly the bytes written.
pub struct MetadataWriter {
    out: BufWriter<File>,
    hasher: blake3::Hasher,
    count: usize,
}

impl MetadataWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self { out: BufWriter::new(File::create(path)?), hasher: blake3::Hasher::new(), count: 0 })
    }

    pub fn append(&mut self, texts: &[String]) -> Result<()> {
        for text in texts {
            let mut line = serde_json::to_string(&ChunkRecord { text: text.clone() })?;
            line.push('\n');
            self.out.write_all(line.as_bytes())?;
            self.hasher.update(line.as_bytes());
            self.count += 1;
        }
        Ok(())
    }

    pub fn count(&self) -> usize { self.count }

    /// Flush and fsync; returns `(records, blake3 hex digest)`.
    pub fn finish(self) -> Result<(usize, String)> {
        let file = self.out.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        file.sync_all()?;
        Ok((self.count, self.hasher.finalize().to_hex().to_string()))
    }
}

pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 { break; }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
