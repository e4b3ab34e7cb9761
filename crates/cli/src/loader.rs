//! Reading task and knowledge collections from disk.
//!
//! A collection file is either a JSON array or JSON Lines (one object per
//! line, blank lines ignored).

use std::path::Path;

use campus_core::{AppError, AppResult, TaskInfo};
use campus_knowledge::{KnowledgeEntry, RawKnowledgeRecord};
use serde::de::DeserializeOwned;

pub fn load_tasks(path: &Path) -> AppResult<Vec<TaskInfo>> {
    let tasks: Vec<TaskInfo> = read_records(path)?;
    tracing::info!("Loaded {} tasks from {:?}", tasks.len(), path);
    Ok(tasks)
}

pub fn load_knowledge(path: &Path) -> AppResult<Vec<KnowledgeEntry>> {
    let raw: Vec<RawKnowledgeRecord> = read_records(path)?;
    let entries: Vec<KnowledgeEntry> = raw
        .into_iter()
        .map(RawKnowledgeRecord::normalize)
        .filter(|entry| {
            if entry.task_id.is_empty() {
                tracing::warn!("Skipping knowledge record without task_id");
                return false;
            }
            true
        })
        .collect();
    tracing::info!("Loaded {} knowledge entries from {:?}", entries.len(), path);
    Ok(entries)
}

fn read_records<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    if !path.exists() {
        return Err(AppError::Config(format!("Data file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)?;
    parse_records(&contents)
        .map_err(|e| AppError::Serialization(format!("Failed to parse {:?}: {}", path, e)))
}

fn parse_records<T: DeserializeOwned>(contents: &str) -> AppResult<Vec<T>> {
    let trimmed = contents.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| AppError::Serialization(format!("line {}: {}", i + 1, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_json_array_tasks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"task_id":"T001","title":"图书馆文献检索","description":"学习检索","category":"academic","location_name":"图书馆","location_lat":22.3,"location_lng":114.2}]"#,
        )
        .unwrap();

        let tasks = load_tasks(&path).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].lat, Some(22.3));
        assert_eq!(tasks[0].category.as_deref(), Some("academic"));
    }

    #[test]
    fn test_jsonl_knowledge_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb.jsonl");
        fs::write(
            &path,
            "{\"task_id\":\"T001\",\"knowledge_type\":\"procedure\",\"content\":\"步骤一。\"}\n\n{\"task_id\":\"T002\",\"title\":\"须知\",\"content\":\"注意安全。\"}\n",
        )
        .unwrap();

        let entries = load_knowledge(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "操作流程");
        assert_eq!(entries[1].title, "须知");
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let result: AppResult<Vec<TaskInfo>> =
            parse_records("{\"task_id\":\"T1\",\"title\":\"a\",\"description\":\"\"}\nnot json");
        match result {
            Err(AppError::Serialization(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_tasks(&dir.path().join("missing.json")),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_empty_file_is_empty_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.jsonl");
        fs::write(&path, "\n").unwrap();
        assert!(load_knowledge(&path).unwrap().is_empty());
    }
}
