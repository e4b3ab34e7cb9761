//! Check command handler.
//!
//! Reports tasks without knowledge and knowledge without tasks.

use campus_core::{AppError, AppResult};
use campus_knowledge::ConsistencyReport;
use clap::Args;

use crate::state::CampusState;

/// Check that tasks and knowledge entries line up
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Fail when any inconsistency is found
    #[arg(long)]
    pub strict: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub fn execute(&self, state: &CampusState) -> AppResult<()> {
        tracing::info!("Executing check command");

        let snapshot = state.snapshot()?;
        let report = snapshot.report();
        println!("{}", self.render(report)?);

        if self.strict && !report.is_consistent() {
            return Err(AppError::Knowledge(format!(
                "{} tasks without knowledge, {} orphaned knowledge entries",
                report.tasks_without_knowledge.len(),
                report.orphaned_knowledge.len()
            )));
        }
        Ok(())
    }

    fn render(&self, report: &ConsistencyReport) -> AppResult<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut out = format!(
            "{} tasks, {} knowledge entries",
            report.task_count, report.knowledge_count
        );
        if report.is_consistent() {
            out.push_str("\nAll tasks have knowledge.");
            return Ok(out);
        }
        if !report.tasks_without_knowledge.is_empty() {
            out.push_str(&format!(
                "\nTasks without knowledge: {}",
                report.tasks_without_knowledge.join(", ")
            ));
        }
        if !report.orphaned_knowledge.is_empty() {
            out.push_str(&format!(
                "\nKnowledge for unknown tasks: {}",
                report.orphaned_knowledge.join(", ")
            ));
        }
        Ok(out)
    }
}
