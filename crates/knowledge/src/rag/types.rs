//! Chat result types.

use serde::{Deserialize, Serialize};

/// Answer used when a request runs out of time.
pub const TIMEOUT_ANSWER: &str = "抱歉，处理您的问题时超时，请稍后重试。";

/// Answer used when a request fails for any other reason.
pub const ERROR_ANSWER: &str = "抱歉，处理您的问题时出现了错误，请稍后重试。";

/// Answer used when the backend returns an empty answer.
pub const FALLBACK_ANSWER: &str = "抱歉，我无法回答这个问题。";

pub const TIMEOUT_REASON: &str = "请求超时";

pub const ERROR_REASON: &str = "系统处理错误";

/// Reason attached to low-confidence or partially answered questions.
pub const UNCERTAIN_REASON: &str = "知识库信息不足，建议咨询相关工作人员或查看更多资料";

/// Marker appended to truncated citation content.
pub const ELLIPSIS: &str = "...";

/// One retrieved snippet backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Title of the knowledge entry the snippet came from
    pub source: String,

    /// Truncated snippet text, always ending in [`ELLIPSIS`]
    pub content: String,

    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MapAnchor {
    pub lat: f64,
    pub lng: f64,
}

impl From<(f64, f64)> for MapAnchor {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// A follow-up the user can take when the answer is thin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// "related_task" or "contact"
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
}

impl Suggestion {
    pub fn new(kind: &str, title: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Result of one chat call. Always produced, even when the pipeline degrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub answer: String,

    pub citations: Vec<Citation>,

    pub map_anchor: MapAnchor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertain_reason: Option<String>,
}

impl RagResult {
    /// The degraded result for a request that ran out of time.
    pub fn timed_out() -> Self {
        Self::degraded(TIMEOUT_ANSWER, TIMEOUT_REASON)
    }

    /// The degraded result for any other failure.
    pub fn failed() -> Self {
        Self::degraded(ERROR_ANSWER, ERROR_REASON)
    }

    fn degraded(answer: &str, reason: &str) -> Self {
        Self {
            answer: answer.to_string(),
            citations: Vec::new(),
            map_anchor: MapAnchor::default(),
            suggestions: None,
            uncertain_reason: Some(reason.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(
            self.uncertain_reason.as_deref(),
            Some(TIMEOUT_REASON) | Some(ERROR_REASON)
        )
    }
}
