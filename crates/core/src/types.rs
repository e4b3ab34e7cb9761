//! Domain types shared between the retrieval, prompt and chat layers.

use serde::{Deserialize, Serialize};

/// Context about the task a chat question is asked against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub task_id: String,

    pub title: String,

    pub description: String,

    /// Task category (e.g. "academic", "activity"), drives suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Human-readable place name
    #[serde(default)]
    pub location_name: String,

    #[serde(default, alias = "location_lat", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, alias = "location_lng", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl TaskInfo {
    /// Coordinates for map display, `(0.0, 0.0)` when the task has no location.
    pub fn anchor(&self) -> (f64, f64) {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => (0.0, 0.0),
        }
    }
}

/// A knowledge snippet scored against one query. Produced per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Snippet text
    pub content: String,

    /// Relevance score (>= 0)
    pub score: f64,

    /// Label of the knowledge entry the snippet came from
    pub source: String,

    /// Position of the snippet within its entry
    pub chunk_index: usize,
}

/// Render a score without a trailing `.0` for whole numbers.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{}", score)
    }
}
