//! Chat orchestration: retrieve, prompt, generate, shape.
//!
//! The pipeline never returns an error. Failures collapse into the degraded
//! [`RagResult`] shapes so callers always have something to show.

use std::sync::Arc;

use campus_core::config::RetrievalConfig;
use campus_core::{AppError, AppResult, ScoredChunk, TaskInfo};
use campus_llm::{Confidence, GenerationRequest, GenerationResponse, LlmGateway};
use campus_prompt::{build_chat_prompt, PromptDefinition};
use tracing::instrument;

use crate::rag::types::{
    Citation, RagResult, Suggestion, ELLIPSIS, FALLBACK_ANSWER, UNCERTAIN_REASON,
};
use crate::retriever::KnowledgeRetriever;

pub struct RagService {
    retriever: KnowledgeRetriever,
    gateway: Arc<LlmGateway>,
    prompt: PromptDefinition,
    top_k: usize,
    citation_chars: usize,
}

impl RagService {
    pub fn new(
        retriever: KnowledgeRetriever,
        gateway: Arc<LlmGateway>,
        prompt: PromptDefinition,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            gateway,
            prompt,
            top_k: config.top_k,
            citation_chars: config.citation_chars,
        }
    }

    pub fn retriever(&self) -> &KnowledgeRetriever {
        &self.retriever
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    pub fn prompt(&self) -> &PromptDefinition {
        &self.prompt
    }

    /// Answer `question` about the task, grounded in its knowledge.
    #[instrument(skip(self, question, task), fields(prompt = %self.prompt.id))]
    pub async fn process_chat_request(
        &self,
        task_id: &str,
        question: &str,
        task: &TaskInfo,
    ) -> RagResult {
        match self.run(task_id, question, task).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Chat for task {} degraded: {}", task_id, err);
                RagResult::from(&err)
            }
        }
    }

    async fn run(&self, task_id: &str, question: &str, task: &TaskInfo) -> AppResult<RagResult> {
        let chunks = self
            .retriever
            .search_relevant_chunks(task_id, question, self.top_k);
        tracing::info!(
            "Retrieved {} knowledge chunks for task {}",
            chunks.len(),
            task_id
        );

        let built = build_chat_prompt(&self.prompt, task, &chunks, question)?;
        let request = GenerationRequest::new(built.system, built.user);

        let response = self.gateway.generate(&request).await?;

        Ok(self.shape(response, &chunks, task))
    }

    fn shape(
        &self,
        response: GenerationResponse,
        chunks: &[ScoredChunk],
        task: &TaskInfo,
    ) -> RagResult {
        let uncertain_reason = response
            .is_uncertain()
            .then(|| UNCERTAIN_REASON.to_string());

        let suggestions = (chunks.is_empty() || response.confidence == Confidence::Low)
            .then(|| suggestions_for(task));

        let answer = if response.answer.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            response.answer
        };

        RagResult {
            answer,
            citations: chunks
                .iter()
                .map(|chunk| citation(chunk, self.citation_chars))
                .collect(),
            map_anchor: task.anchor().into(),
            suggestions,
            uncertain_reason,
        }
    }
}

fn citation(chunk: &ScoredChunk, max_chars: usize) -> Citation {
    let mut content: String = chunk.content.chars().take(max_chars).collect();
    content.push_str(ELLIPSIS);
    Citation {
        source: chunk.source.clone(),
        content,
        score: chunk.score,
    }
}

/// Category-specific follow-ups, always ending with a contact entry.
pub fn suggestions_for(task: &TaskInfo) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    match task.category.as_deref() {
        Some("academic") => suggestions.push(Suggestion::new(
            "related_task",
            "学术研究方法指导",
            "了解更多学术研究相关的任务和资源",
        )),
        Some("activity") => suggestions.push(Suggestion::new(
            "related_task",
            "校园活动参与指南",
            "查看更多校园活动和参与方式",
        )),
        _ => {}
    }

    suggestions.push(Suggestion::new(
        "contact",
        "联系相关工作人员",
        "如需更详细信息，建议直接联系任务负责人",
    ));
    suggestions
}

impl From<&AppError> for RagResult {
    fn from(err: &AppError) -> Self {
        if err.is_timeout() {
            RagResult::timed_out()
        } else {
            RagResult::failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            score: 2.0,
            source: "操作流程".to_string(),
            chunk_index: 0,
        }
    }

    #[test]
    fn test_citation_truncates_by_chars() {
        let long: String = "图".repeat(150);
        let c = citation(&chunk(&long), 100);
        assert_eq!(c.content.chars().count(), 103);
        assert!(c.content.ends_with("..."));
        assert_eq!(c.source, "操作流程");
        assert_eq!(c.score, 2.0);
    }

    #[test]
    fn test_short_citation_still_marked() {
        assert_eq!(citation(&chunk("短"), 100).content, "短...");
    }

    #[test]
    fn test_suggestions_by_category() {
        let mut task = TaskInfo::default();
        let plain = suggestions_for(&task);
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].kind, "contact");

        task.category = Some("academic".to_string());
        let academic = suggestions_for(&task);
        assert_eq!(academic[0].title, "学术研究方法指导");
        assert_eq!(academic[1].kind, "contact");

        task.category = Some("activity".to_string());
        assert_eq!(suggestions_for(&task)[0].title, "校园活动参与指南");
    }

    #[test]
    fn test_error_maps_to_degraded_result() {
        let timeout = RagResult::from(&AppError::Timeout("t".to_string()));
        assert_eq!(timeout, RagResult::timed_out());
        let other = RagResult::from(&AppError::Llm("x".to_string()));
        assert_eq!(other, RagResult::failed());
    }
}
