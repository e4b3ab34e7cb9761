//! Per-task knowledge lookup and snippet ranking.

use std::sync::Arc;

use campus_core::config::{RetrievalConfig, RetrievalMode};
use campus_core::ScoredChunk;

use crate::chunker::split_content;
use crate::terms::{extract_terms, overlap};
use crate::types::{KnowledgeBase, KnowledgeEntry};

/// Title terms count this many times content terms in the relevance gate.
const TITLE_WEIGHT: usize = 2;

#[derive(Debug, Clone)]
pub struct KnowledgeRetriever {
    base: Arc<KnowledgeBase>,
    chunk_size: usize,
    mode: RetrievalMode,
}

impl KnowledgeRetriever {
    pub fn new(base: Arc<KnowledgeBase>, config: &RetrievalConfig) -> Self {
        Self {
            base,
            chunk_size: config.chunk_size,
            mode: config.mode,
        }
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    /// Knowledge for exactly `task_id`, if any.
    pub fn retrieve(&self, task_id: &str) -> Option<&KnowledgeEntry> {
        self.base.get(task_id)
    }

    /// Up to `top_k` snippets of the task's knowledge ranked against `query`.
    ///
    /// Unknown tasks and queries sharing no term with the entry yield an empty list.
    pub fn search_relevant_chunks(
        &self,
        task_id: &str,
        query: &str,
        top_k: usize,
    ) -> Vec<ScoredChunk> {
        let Some(entry) = self.retrieve(task_id) else {
            tracing::debug!("No knowledge for task {}", task_id);
            return Vec::new();
        };

        match self.mode {
            RetrievalMode::Keyword => self.keyword_search(entry, query, top_k),
            RetrievalMode::Semantic => self.semantic_search(entry, query, top_k),
        }
    }

    fn keyword_search(
        &self,
        entry: &KnowledgeEntry,
        query: &str,
        top_k: usize,
    ) -> Vec<ScoredChunk> {
        let query_terms = extract_terms(query);
        let content_score = overlap(&query_terms, &extract_terms(&entry.content));
        let title_score = overlap(&query_terms, &extract_terms(&entry.title)) * TITLE_WEIGHT;

        if content_score + title_score == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredChunk> = split_content(&entry.content, self.chunk_size)
            .into_iter()
            .enumerate()
            .filter_map(|(chunk_index, content)| {
                let score = overlap(&query_terms, &extract_terms(&content));
                tracing::debug!(
                    "Chunk {} of {} scored {}",
                    chunk_index,
                    entry.task_id,
                    score
                );
                (score > 0).then(|| ScoredChunk {
                    content,
                    score: score as f64,
                    source: entry.title.clone(),
                    chunk_index,
                })
            })
            .collect();

        // Stable: equal scores keep content order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }

    /// Vector similarity is not available yet; ranks exactly like the keyword path.
    fn semantic_search(
        &self,
        entry: &KnowledgeEntry,
        query: &str,
        top_k: usize,
    ) -> Vec<ScoredChunk> {
        tracing::debug!("Semantic retrieval falls back to keyword scoring");
        self.keyword_search(entry, query, top_k)
    }
}
