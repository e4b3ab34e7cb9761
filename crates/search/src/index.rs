//! BM25 term statistics over a task collection.
//!
//! An index is built once from a whole collection and is immutable afterwards.
//! Rebuilding constructs a fresh index; there are no incremental updates.

use crate::tokenizer::tokenize;
use crate::types::Document;
use campus_core::config::SearchConfig;
use std::collections::HashMap;

/// Tunable BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,
    /// Document length normalization
    pub b: f64,
    /// Lower bound on IDF so terms present in most documents still count
    pub idf_floor: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            idf_floor: 0.1,
        }
    }
}

impl From<&SearchConfig> for Bm25Params {
    fn from(config: &SearchConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
            idf_floor: config.idf_floor,
        }
    }
}

/// Frozen BM25 statistics for one document collection.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    documents: Vec<Document>,
    /// Token counts per document, aligned with `documents`
    term_freqs: Vec<HashMap<String, u32>>,
    doc_len: Vec<usize>,
    doc_freqs: HashMap<String, usize>,
    idf: HashMap<String, f64>,
    avgdl: f64,
}

impl Bm25Index {
    /// Build an index over `documents`.
    ///
    /// Searchable text per document is its title followed by its description.
    pub fn build(documents: Vec<Document>, params: Bm25Params) -> Self {
        tracing::info!("Building search index over {} documents", documents.len());

        let mut term_freqs = Vec::with_capacity(documents.len());
        let mut doc_len = Vec::with_capacity(documents.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for doc in &documents {
            let tokens = tokenize(&doc.searchable_text());
            doc_len.push(tokens.len());

            let mut counts: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *counts.entry(token).or_insert(0) += 1;
            }
            for token in counts.keys() {
                *doc_freqs.entry(token.clone()).or_insert(0) += 1;
            }
            term_freqs.push(counts);
        }

        let corpus_size = documents.len();
        let avgdl = if doc_len.is_empty() {
            0.0
        } else {
            doc_len.iter().sum::<usize>() as f64 / doc_len.len() as f64
        };

        let idf = doc_freqs
            .iter()
            .map(|(token, &df)| {
                let raw = (corpus_size as f64 / df as f64).ln();
                (token.clone(), raw.max(params.idf_floor))
            })
            .collect::<HashMap<_, _>>();

        tracing::info!(
            "Search index built: {} terms, avgdl {:.2}",
            idf.len(),
            avgdl
        );

        Self {
            params,
            documents,
            term_freqs,
            doc_len,
            doc_freqs,
            idf,
            avgdl,
        }
    }

    /// Replace all index state with statistics over a new collection.
    pub fn rebuild(&mut self, documents: Vec<Document>) {
        *self = Self::build(documents, self.params);
    }

    /// BM25 score of `doc_index` for `query_tokens`.
    ///
    /// Each occurrence in `query_tokens` contributes; tokens outside the
    /// vocabulary or absent from the document contribute nothing. Returns 0.0
    /// for an out-of-range document.
    pub fn score(&self, query_tokens: &[String], doc_index: usize) -> f64 {
        let (Some(counts), Some(&len)) =
            (self.term_freqs.get(doc_index), self.doc_len.get(doc_index))
        else {
            return 0.0;
        };

        if self.avgdl <= 0.0 {
            return 0.0;
        }

        let Bm25Params { k1, b, .. } = self.params;
        let length_norm = 1.0 - b + b * (len as f64 / self.avgdl);

        query_tokens
            .iter()
            .filter_map(|token| {
                let idf = self.idf.get(token)?;
                let tf = f64::from(*counts.get(token)?);
                Some(idf * (tf * (k1 + 1.0)) / (tf + k1 * length_norm))
            })
            .sum()
    }

    /// Whether document `doc_index` contains `token` at least once.
    pub fn contains(&self, doc_index: usize, token: &str) -> bool {
        self.term_freqs
            .get(doc_index)
            .is_some_and(|counts| counts.contains_key(token))
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, doc_index: usize) -> Option<&Document> {
        self.documents.get(doc_index)
    }

    pub fn corpus_size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Mean token count across documents (0.0 for an empty corpus).
    pub fn avgdl(&self) -> f64 {
        self.avgdl
    }

    pub fn doc_len(&self, doc_index: usize) -> Option<usize> {
        self.doc_len.get(doc_index).copied()
    }

    /// Number of documents containing `token`.
    pub fn document_frequency(&self, token: &str) -> usize {
        self.doc_freqs.get(token).copied().unwrap_or(0)
    }

    pub fn idf(&self, token: &str) -> Option<f64> {
        self.idf.get(token).copied()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }
}
