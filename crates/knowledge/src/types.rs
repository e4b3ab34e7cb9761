//! Knowledge entries and their ingestion-time normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Display titles for known knowledge types.
const TYPE_TITLES: &[(&str, &str)] = &[
    ("procedure", "操作流程"),
    ("safety_guide", "安全指南"),
    ("interview_tips", "面试技巧"),
    ("guide_script", "导览脚本"),
    ("project_requirements", "项目要求"),
    ("photography_guide", "摄影指南"),
    ("business_plan", "商业计划"),
    ("fitness_plan", "健身计划"),
    ("performance_guide", "表演指南"),
    ("lab_procedure", "实验流程"),
    ("food_review", "美食评价"),
    ("academic_notes", "学术笔记"),
];

/// Title for a knowledge type, or the type itself when it is not in the table.
pub fn title_for_type(knowledge_type: &str) -> String {
    TYPE_TITLES
        .iter()
        .find(|(t, _)| *t == knowledge_type)
        .map(|(_, title)| title.to_string())
        .unwrap_or_else(|| knowledge_type.to_string())
}

/// Knowledge about one task. Keys are unique per task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub task_id: String,

    #[serde(default)]
    pub knowledge_type: String,

    /// Label used as the source of every snippet cut from this entry
    pub title: String,

    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub difficulty: String,

    /// Estimated minutes to work through the entry
    #[serde(default)]
    pub estimated_time: u32,

    #[serde(default)]
    pub course_code: String,
}

/// A knowledge record as found in data files.
///
/// Field names and shapes vary between sources; [`RawKnowledgeRecord::normalize`]
/// settles them once so readers only ever see [`KnowledgeEntry`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawKnowledgeRecord {
    pub task_id: String,

    #[serde(default)]
    pub knowledge_type: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub content: String,

    /// A list, a JSON-array string, or a single tag
    #[serde(default)]
    pub tags: Option<Value>,

    #[serde(default, alias = "difficulty_level")]
    pub difficulty: Option<String>,

    /// Minutes as a number or a numeric string
    #[serde(default, alias = "estimated_read_time")]
    pub estimated_time: Option<Value>,

    #[serde(default)]
    pub course_code: Option<String>,
}

impl RawKnowledgeRecord {
    pub fn normalize(self) -> KnowledgeEntry {
        let knowledge_type = self.knowledge_type.unwrap_or_default();
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => title_for_type(&knowledge_type),
        };

        KnowledgeEntry {
            task_id: self.task_id.trim().to_string(),
            knowledge_type,
            title,
            content: self.content,
            tags: normalize_tags(self.tags),
            difficulty: self.difficulty.unwrap_or_default(),
            estimated_time: normalize_minutes(self.estimated_time),
            course_code: self.course_code.unwrap_or_default(),
        }
    }
}

fn normalize_tags(raw: Option<Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) if s.trim_start().starts_with('[') => {
            serde_json::from_str::<Vec<String>>(&s).unwrap_or_else(|_| vec![s])
        }
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    }
}

fn normalize_minutes(raw: Option<Value>) -> u32 {
    match raw {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|m| m.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// All knowledge entries, keyed by exact task id.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Index `entries` by task id. A later entry replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = KnowledgeEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            if let Some(previous) = map.insert(entry.task_id.clone(), entry) {
                tracing::warn!(
                    "Duplicate knowledge for task {}, keeping the later entry",
                    previous.task_id
                );
            }
        }
        tracing::info!("Knowledge base loaded: {} tasks", map.len());
        Self { entries: map }
    }

    pub fn get(&self, task_id: &str) -> Option<&KnowledgeEntry> {
        self.entries.get(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.entries.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Task ids in sorted order.
    pub fn task_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
