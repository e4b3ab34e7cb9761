//! Cross-checks between the task catalogue and the knowledge base.

use serde::Serialize;
use std::collections::HashSet;

use crate::types::KnowledgeBase;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub task_count: usize,
    pub knowledge_count: usize,
    /// Tasks with no knowledge entry, sorted
    pub tasks_without_knowledge: Vec<String>,
    /// Knowledge entries whose task does not exist, sorted
    pub orphaned_knowledge: Vec<String>,
}

impl ConsistencyReport {
    pub fn check<'a>(
        task_ids: impl IntoIterator<Item = &'a str>,
        knowledge: &KnowledgeBase,
    ) -> Self {
        let tasks: HashSet<&str> = task_ids.into_iter().collect();

        let mut tasks_without_knowledge: Vec<String> = tasks
            .iter()
            .filter(|id| !knowledge.contains(id))
            .map(|id| id.to_string())
            .collect();
        tasks_without_knowledge.sort_unstable();

        let orphaned_knowledge: Vec<String> = knowledge
            .task_ids()
            .into_iter()
            .filter(|id| !tasks.contains(id))
            .map(str::to_string)
            .collect();

        if !orphaned_knowledge.is_empty() {
            tracing::warn!(
                "{} knowledge entries reference unknown tasks",
                orphaned_knowledge.len()
            );
        }

        Self {
            task_count: tasks.len(),
            knowledge_count: knowledge.len(),
            tasks_without_knowledge,
            orphaned_knowledge,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.tasks_without_knowledge.is_empty() && self.orphaned_knowledge.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnowledgeEntry;

    fn entry(task_id: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            task_id: task_id.to_string(),
            knowledge_type: "procedure".to_string(),
            title: "操作流程".to_string(),
            content: "内容。".to_string(),
            tags: Vec::new(),
            difficulty: String::new(),
            estimated_time: 0,
            course_code: String::new(),
        }
    }

    #[test]
    fn test_reports_both_directions() {
        let kb = KnowledgeBase::from_entries(vec![entry("T001"), entry("T009")]);
        let report = ConsistencyReport::check(["T003", "T001", "T002"], &kb);

        assert_eq!(report.task_count, 3);
        assert_eq!(report.knowledge_count, 2);
        assert_eq!(report.tasks_without_knowledge, vec!["T002", "T003"]);
        assert_eq!(report.orphaned_knowledge, vec!["T009"]);
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_consistent_data() {
        let kb = KnowledgeBase::from_entries(vec![entry("T001")]);
        assert!(ConsistencyReport::check(["T001"], &kb).is_consistent());
    }
}
