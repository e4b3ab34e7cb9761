//! Query API over a BM25 index.
//!
//! Besides the BM25 score, every candidate must cover a minimum fraction of
//! the distinct query tokens. English queries carry few, highly informative
//! tokens, so nearly all of them must match; Chinese queries are split per
//! character, so partial coverage is enough.

use std::collections::HashSet;
use std::sync::Arc;

use campus_core::config::SearchConfig;

use crate::index::Bm25Index;
use crate::tokenizer::{is_ascii_word, tokenize};
use crate::types::SearchHit;

/// Minimum match ratios for the inclusion gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Used when any query token is a pure ASCII word
    pub ascii_min_match_ratio: f64,
    /// Used otherwise
    pub cjk_min_match_ratio: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            ascii_min_match_ratio: 0.8,
            cjk_min_match_ratio: 0.3,
        }
    }
}

impl From<&SearchConfig> for MatchPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            ascii_min_match_ratio: config.ascii_min_match_ratio,
            cjk_min_match_ratio: config.cjk_min_match_ratio,
        }
    }
}

impl MatchPolicy {
    /// Threshold that applies to `query_tokens`.
    pub fn threshold(&self, query_tokens: &[String]) -> f64 {
        if query_tokens.iter().any(|t| is_ascii_word(t)) {
            self.ascii_min_match_ratio
        } else {
            self.cjk_min_match_ratio
        }
    }
}

/// Ranked search over one immutable index.
#[derive(Debug, Clone)]
pub struct SearchService {
    index: Arc<Bm25Index>,
    policy: MatchPolicy,
}

impl SearchService {
    pub fn new(index: Arc<Bm25Index>, policy: MatchPolicy) -> Self {
        Self { index, policy }
    }

    pub fn index(&self) -> &Bm25Index {
        &self.index
    }

    /// Rank documents for `query`, returning at most `top_n` hits.
    ///
    /// Ties keep the order documents were indexed in.
    pub fn search(&self, query: &str, top_n: usize) -> Vec<SearchHit> {
        if query.trim().is_empty() || self.index.is_empty() || top_n == 0 {
            return Vec::new();
        }

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        tracing::debug!("Query '{}' tokenized to {:?}", query, query_tokens);

        let distinct: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
        let threshold = self.policy.threshold(&query_tokens);

        let mut scored: Vec<(usize, f64)> = (0..self.index.corpus_size())
            .filter_map(|doc_index| {
                let matched = distinct
                    .iter()
                    .filter(|token| self.index.contains(doc_index, token))
                    .count();
                if matched == 0 {
                    return None;
                }

                let ratio = matched as f64 / distinct.len() as f64;
                if ratio < threshold {
                    return None;
                }

                let score = self.index.score(&query_tokens, doc_index);
                (score > 0.0).then_some((doc_index, score))
            })
            .collect();

        // sort_by is stable: equal scores stay in index order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_n);

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .filter_map(|(doc_index, score)| {
                let doc = self.index.document(doc_index)?;
                Some(SearchHit {
                    task_id: doc.id.clone(),
                    title: doc.title.clone(),
                    score: round4(score),
                    lat: doc.lat,
                    lng: doc.lng,
                })
            })
            .collect();

        tracing::info!("Search '{}' returned {} results", query, hits.len());
        hits
    }
}

fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Bm25Params;
    use crate::types::Document;

    fn service(docs: Vec<Document>) -> SearchService {
        let index = Bm25Index::build(docs, Bm25Params::default());
        SearchService::new(Arc::new(index), MatchPolicy::default())
    }

    #[test]
    fn test_threshold_selection() {
        let policy = MatchPolicy::default();
        assert_eq!(policy.threshold(&tokenize("library")), 0.8);
        assert_eq!(policy.threshold(&tokenize("图书馆")), 0.3);
        assert_eq!(policy.threshold(&tokenize("图书馆 lab")), 0.8);
        // Digits alone are not an ASCII word
        assert_eq!(policy.threshold(&tokenize("图书馆 2024")), 0.3);
    }

    #[test]
    fn test_english_query_needs_high_coverage() {
        let svc = service(vec![
            Document::new("A", "Library Research", "", 0.0, 0.0),
            Document::new("B", "Library Tour", "", 0.0, 0.0),
        ]);

        // Only A covers both words; B reaches 0.5 < 0.8
        let hits = svc.search("library research", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, "A");
    }

    #[test]
    fn test_single_shared_character_is_not_enough() {
        let svc = service(vec![
            Document::new("A", "图书馆文献检索", "", 0.0, 0.0),
            Document::new("B", "书法社团", "", 0.0, 0.0),
        ]);

        // "图书馆检索" has 5 distinct chars; B shares only 书 (0.2 < 0.3)
        let hits = svc.search("图书馆检索", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task_id, "A");
    }

    #[test]
    fn test_top_n_zero_is_empty() {
        let svc = service(vec![Document::new("A", "lab", "", 0.0, 0.0)]);
        assert!(svc.search("lab", 0).is_empty());
    }

    #[test]
    fn test_scores_rounded() {
        let svc = service(vec![
            Document::new("A", "lab safety", "", 0.0, 0.0),
            Document::new("B", "library", "", 0.0, 0.0),
            Document::new("C", "gym", "", 0.0, 0.0),
        ]);
        let hits = svc.search("lab", 10);
        assert_eq!(hits.len(), 1);
        let score = hits[0].score;
        assert_eq!(score, round4(score));
    }

    #[test]
    fn test_ties_keep_index_order() {
        let svc = service(vec![
            Document::new("X", "gym", "", 0.0, 0.0),
            Document::new("A", "lab", "", 0.0, 0.0),
            Document::new("B", "lab", "", 0.0, 0.0),
        ]);
        let ids: Vec<_> = svc.search("lab", 10).into_iter().map(|h| h.task_id).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_hit_carries_coordinates() {
        let svc = service(vec![
            Document::new("A", "lab", "", 22.3364, 114.1717),
            Document::new("B", "gym", "", 0.0, 0.0),
        ]);
        let hits = svc.search("lab", 10);
        assert_eq!(hits[0].lat, 22.3364);
        assert_eq!(hits[0].lng, 114.1717);
    }
}
