//! Chat command handler.

use campus_core::{AppError, AppResult};
use campus_knowledge::RagResult;
use clap::Args;

use crate::state::CampusState;

/// Ask a question about a task, answered from its knowledge
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Task identifier (e.g. T001)
    pub task_id: String,

    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, state: &CampusState, client: &str) -> AppResult<()> {
        tracing::info!("Executing chat command for task {}", self.task_id);

        let result = state.chat(client, &self.task_id, &self.question).await?;
        println!("{}", self.render(&result)?);
        outcome(&result)
    }

    fn render(&self, result: &RagResult) -> AppResult<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(result)?);
        }

        let mut out = result.answer.clone();

        if !result.citations.is_empty() {
            out.push_str("\n\nSources:");
            for (i, citation) in result.citations.iter().enumerate() {
                out.push_str(&format!(
                    "\n  [{}] {} (score {}): {}",
                    i + 1,
                    citation.source,
                    citation.score,
                    citation.content
                ));
            }
        }

        if let Some(reason) = &result.uncertain_reason {
            out.push_str(&format!("\n\nNote: {}", reason));
        }

        if let Some(suggestions) = &result.suggestions {
            out.push_str("\n\nSuggestions:");
            for s in suggestions {
                out.push_str(&format!("\n  - {}: {}", s.title, s.description));
            }
        }

        let anchor = result.map_anchor;
        if anchor.lat != 0.0 || anchor.lng != 0.0 {
            out.push_str(&format!("\n\nLocation: ({:.4}, {:.4})", anchor.lat, anchor.lng));
        }

        Ok(out)
    }
}

/// Degraded answers are still printed but fail the command.
fn outcome(result: &RagResult) -> AppResult<()> {
    if result.is_degraded() {
        let reason = result.uncertain_reason.clone().unwrap_or_default();
        return Err(AppError::Other(format!("Chat degraded: {}", reason)));
    }
    Ok(())
}
