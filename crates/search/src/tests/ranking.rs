//! End-to-end ranking over a small campus task collection.

use crate::{build_service, Document, SearchService};
use campus_core::config::SearchConfig;

fn campus_service() -> SearchService {
    let docs = vec![
        Document::new(
            "T001",
            "图书馆文献检索",
            "学习使用图书馆数据库检索学术文献",
            22.3364,
            114.1717,
        ),
        Document::new(
            "T002",
            "实验室安全培训",
            "完成化学实验室安全培训课程",
            22.3370,
            114.1720,
        ),
        Document::new(
            "T003",
            "学生会招新面试",
            "参加学生会招新面试并了解各部门职责",
            22.3380,
            114.1730,
        ),
    ];
    build_service(docs, &SearchConfig::default())
}

#[test]
fn test_library_query_ranks_t001_first() {
    let hits = campus_service().search("图书馆", 10);
    assert!(!hits.is_empty());
    assert_eq!(hits[0].task_id, "T001");
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[0].lat, 22.3364);
}

#[test]
fn test_safety_query_ranks_t002_first() {
    let hits = campus_service().search("安全", 10);
    assert!(!hits.is_empty());
    assert_eq!(hits[0].task_id, "T002");
}

#[test]
fn test_blank_queries_are_empty() {
    let svc = campus_service();
    assert!(svc.search("", 10).is_empty());
    assert!(svc.search("   ", 10).is_empty());
    assert!(svc.search("\t\n", 10).is_empty());
}

#[test]
fn test_punctuation_only_query_is_empty() {
    assert!(campus_service().search("？！，。", 10).is_empty());
}

#[test]
fn test_unmatched_query_is_empty() {
    let svc = campus_service();
    assert!(svc.search("zebra", 10).is_empty());
    assert!(svc.search("鲸鱼", 10).is_empty());
}

#[test]
fn test_results_sorted_descending() {
    let hits = campus_service().search("学生图书馆", 10);
    assert!(!hits.is_empty());
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_top_n_bounds_results() {
    let hits = campus_service().search("学", 1);
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_empty_index_returns_nothing() {
    let svc = build_service(Vec::new(), &SearchConfig::default());
    assert!(svc.search("图书馆", 10).is_empty());
}

#[test]
fn test_avgdl_recomputed_on_rebuild() {
    let svc = campus_service();
    let index = svc.index();
    let mean = (0..index.corpus_size())
        .map(|i| index.doc_len(i).unwrap_or(0))
        .sum::<usize>() as f64
        / index.corpus_size() as f64;
    assert!((index.avgdl() - mean).abs() < 1e-12);

    let mut rebuilt = index.clone();
    rebuilt.rebuild(vec![Document::new("T009", "健身计划", "", 0.0, 0.0)]);
    assert_eq!(rebuilt.avgdl(), 4.0);
}

#[test]
fn test_documents_deserialize_from_task_records() {
    let json = r#"{
        "task_id": "T001",
        "title": "图书馆文献检索",
        "description": "学习检索",
        "location_lat": 22.3364,
        "location_lng": 114.1717
    }"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.id, "T001");
    assert_eq!(doc.lng, 114.1717);
}
