//! Retrieval-augmented chat over per-task knowledge.

pub mod chat;
pub mod types;

pub use chat::{suggestions_for, RagService};
pub use types::{Citation, MapAnchor, RagResult, Suggestion};
