//! lexrag-core
//!
//! Configuration, error taxonomy, domain types and the collaborator traits
//! shared by the embedding, vector and retrieval crates.

pub mod chunker;
pub mod config;
pub mod error;
pub mod records;
pub mod traits;
pub mod types;

pub use chunker::chunk;
pub use config::{Config, Settings};
pub use error::{Error, Result};
