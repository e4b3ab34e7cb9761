//! Structured generation output.

use serde::{Deserialize, Serialize};

/// How sure the backend is about its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Answer produced by a generation backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub answer: String,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub key_points: Vec<String>,

    #[serde(default)]
    pub actionable_steps: Vec<String>,

    /// Aspects the backend could not answer with confidence
    #[serde(default)]
    pub uncertain_aspects: Vec<String>,
}

impl GenerationResponse {
    /// Whether the answer should be flagged to the user as uncertain.
    pub fn is_uncertain(&self) -> bool {
        self.confidence == Confidence::Low || !self.uncertain_aspects.is_empty()
    }
}
