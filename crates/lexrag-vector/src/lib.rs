//! lexrag-vector
//!
//! Vector index backends and the persisted artifact set: an exact in-memory
//! `FlatIndex`, a LanceDB-backed `LanceVectorIndex`, the `meta.jsonl`
//! metadata store and the build manifest.

pub mod artifacts;
pub mod flat;
pub mod index_build;
pub mod manifest;
pub mod metadata;
pub mod schema;
pub mod store;
pub mod table;
pub mod writer;

pub use artifacts::{IndexPaths, StagedBuild};
pub use flat::FlatIndex;
pub use manifest::Manifest;
pub use metadata::{MetadataStore, MetadataWriter};
pub use store::{LanceVectorIndex, PersistedIndex};
pub use writer::LanceIndexWriter;
