//! Retrieval over knowledge loaded from raw records.

use std::sync::Arc;

use campus_core::config::RetrievalConfig;

use crate::retriever::KnowledgeRetriever;
use crate::types::{KnowledgeBase, RawKnowledgeRecord};

const RECORDS: &str = r#"[
  {
    "task_id": "T001",
    "knowledge_type": "procedure",
    "content": "登录图书馆官网进入数据库页面。选择中国知网并输入关键词检索。下载文献后整理参考文献格式。",
    "tags": "[\"图书馆\", \"检索\"]",
    "difficulty_level": "easy",
    "estimated_read_time": "15"
  },
  {
    "task_id": "T002",
    "knowledge_type": "safety_guide",
    "title": "化学实验室安全须知",
    "content": "Always wear goggles in the lab! 进入实验室必须穿实验服。废液倒入指定回收桶。",
    "tags": ["安全"]
  }
]"#;

fn retriever() -> KnowledgeRetriever {
    let raw: Vec<RawKnowledgeRecord> = serde_json::from_str(RECORDS).unwrap();
    let base = KnowledgeBase::from_entries(raw.into_iter().map(RawKnowledgeRecord::normalize));
    KnowledgeRetriever::new(Arc::new(base), &RetrievalConfig::default())
}

#[test]
fn test_normalized_entries_are_retrievable() {
    let r = retriever();

    let t001 = r.retrieve("T001").unwrap();
    assert_eq!(t001.title, "操作流程");
    assert_eq!(t001.tags, vec!["图书馆", "检索"]);
    assert_eq!(t001.difficulty, "easy");
    assert_eq!(t001.estimated_time, 15);

    assert_eq!(r.retrieve("T002").unwrap().title, "化学实验室安全须知");
}

#[test]
fn test_lookup_is_exact() {
    let r = retriever();
    assert!(r.retrieve("t001").is_none());
    assert!(r.retrieve("T00").is_none());
    assert!(r.retrieve("").is_none());
}

#[test]
fn test_snippets_carry_entry_title() {
    let r = retriever();
    let chunks = r.search_relevant_chunks("T001", "怎么检索知网文献？", 3);

    assert!(!chunks.is_empty());
    assert!(chunks.len() <= 3);
    assert!(chunks.iter().all(|c| c.source == "操作流程"));
    assert!(chunks.iter().all(|c| c.score > 0.0));
}

#[test]
fn test_english_terms_are_case_insensitive() {
    let r = retriever();
    let chunks = r.search_relevant_chunks("T002", "GOGGLES", 3);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].content.starts_with("Always wear goggles"));
}

#[test]
fn test_question_about_other_task_scores_nothing() {
    let r = retriever();
    assert!(r.search_relevant_chunks("T002", "knowledge database", 3).is_empty());
}
