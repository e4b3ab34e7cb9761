//! Task search.
//!
//! Mixed Chinese/English tokenization, a BM25 index built over the whole
//! task collection, and a search service that ranks tasks for a query.

pub mod index;
pub mod service;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use index::{Bm25Index, Bm25Params};
pub use service::{MatchPolicy, SearchService};
pub use tokenizer::tokenize;
pub use types::{Document, SearchHit};

use campus_core::config::SearchConfig;
use std::sync::Arc;

/// Build an index over `documents` and wrap it in a search service configured
/// from `config`.
pub fn build_service(documents: Vec<Document>, config: &SearchConfig) -> SearchService {
    let index = Bm25Index::build(documents, Bm25Params::from(config));
    SearchService::new(Arc::new(index), MatchPolicy::from(config))
}
