//! lexrag-rag
//!
//! Index building, two-stage retrieval and answer composition.

pub mod answer;
pub mod builder;
pub mod retriever;

pub use answer::{Answer, Answerer, ChatTurn};
pub use builder::{BuildReport, IndexBuilder};
pub use retriever::{open_retriever, open_retriever_at, RerankStatus, Retrieval, Retriever};
