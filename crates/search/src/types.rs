use serde::{Deserialize, Serialize};

/// A searchable task. Immutable once handed to an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "task_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "location_lat")]
    pub lat: f64,
    #[serde(default, alias = "location_lng")]
    pub lng: f64,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        lat: f64,
        lng: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            lat,
            lng,
        }
    }

    /// Text that participates in scoring: title, then description.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub task_id: String,
    pub title: String,
    /// BM25 score rounded to 4 decimals
    pub score: f64,
    pub lat: f64,
    pub lng: f64,
}
