//! Deterministic generation backend driven by a fixed script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use campus_core::{AppError, AppResult};

use crate::client::{AnswerGenerator, GenerationRequest};
use crate::types::GenerationResponse;

/// Outcome of one scripted call.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Respond(GenerationResponse),
    /// Fail with a non-timeout error carrying this message
    Fail(String),
    /// Report a timeout immediately
    Timeout,
    /// Never complete; the caller's own timeout must fire
    Hang,
}

/// Replays [`ScriptStep`]s in order, then repeats the last one.
///
/// Records every request together with the (tokio) instant it arrived, so
/// tests can inspect prompts and the spacing between attempts.
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(tokio::time::Instant, GenerationRequest)>>,
}

impl ScriptedGenerator {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A script that produces `step` on every call.
    pub fn always(step: ScriptStep) -> Self {
        Self::new([step])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.lock_requests().iter().map(|(_, r)| r.clone()).collect()
    }

    /// Arrival instants of every call so far.
    pub fn call_instants(&self) -> Vec<tokio::time::Instant> {
        self.lock_requests().iter().map(|(at, _)| *at).collect()
    }

    fn lock_requests(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<(tokio::time::Instant, GenerationRequest)>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_step(&self) -> Option<ScriptStep> {
        let mut steps = self.steps.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            Some(step)
        } else {
            last.clone()
        }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lock_requests()
            .push((tokio::time::Instant::now(), request.clone()));

        match self.next_step() {
            Some(ScriptStep::Respond(response)) => Ok(response),
            Some(ScriptStep::Fail(message)) => Err(AppError::Llm(message)),
            Some(ScriptStep::Timeout) => Err(AppError::Timeout("scripted timeout".to_string())),
            Some(ScriptStep::Hang) => std::future::pending().await,
            None => Err(AppError::Llm("script is empty".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_repeats_last() {
        let ok = GenerationResponse {
            answer: "ok".to_string(),
            ..Default::default()
        };
        let script = ScriptedGenerator::new([
            ScriptStep::Fail("boom".to_string()),
            ScriptStep::Respond(ok),
        ]);
        let request = GenerationRequest::new("s", "u");

        assert!(script.generate(&request).await.is_err());
        assert_eq!(script.generate(&request).await.unwrap().answer, "ok");
        assert_eq!(script.generate(&request).await.unwrap().answer, "ok");
        assert_eq!(script.call_count(), 3);
        assert_eq!(script.requests()[0].user, "u");
    }

    #[tokio::test]
    async fn test_timeout_step_is_timeout() {
        let script = ScriptedGenerator::always(ScriptStep::Timeout);
        let err = script
            .generate(&GenerationRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_empty_script_errors() {
        let script = ScriptedGenerator::new(Vec::new());
        let err = script
            .generate(&GenerationRequest::new("s", "u"))
            .await
            .unwrap_err();
        assert!(!err.is_timeout());
    }
}
