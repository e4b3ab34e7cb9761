//! Generation backend abstraction.

use campus_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::types::GenerationResponse;

/// Prompts for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fixed instruction describing the assistant and the response format
    pub system: String,

    /// Task context, knowledge and the user's question
    pub user: String,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Trait for answer generation backends.
///
/// Implementations report a timed-out call as [`campus_core::AppError::Timeout`]
/// and every other failure as a different variant, so callers can tell the two
/// apart.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Backend name (e.g. "mock").
    fn provider_name(&self) -> &str;

    /// Produce a structured answer for `request`.
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse>;
}
