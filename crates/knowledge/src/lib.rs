//! Per-task campus knowledge and retrieval-augmented chat.
//!
//! Knowledge is keyed by task id. The [`KnowledgeRetriever`] cuts an entry into
//! sentence-aligned snippets and ranks them against a question by term
//! overlap; [`RagService`] feeds the best snippets through the prompt builder
//! and the generation gateway and shapes the answer for display.

pub mod chunker;
pub mod consistency;
pub mod rag;
pub mod retriever;
pub mod terms;
pub mod types;

#[cfg(test)]
mod tests;

pub use consistency::ConsistencyReport;
pub use rag::{Citation, MapAnchor, RagResult, RagService, Suggestion};
pub use retriever::KnowledgeRetriever;
pub use types::{KnowledgeBase, KnowledgeEntry, RawKnowledgeRecord};
