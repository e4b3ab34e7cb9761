//! Stats command handler.
//!
//! Shows index, knowledge and gateway figures for the loaded data.

use std::collections::BTreeMap;

use campus_core::{AppResult, ClientUsage};
use clap::Args;

use crate::state::{CampusState, ServiceStats};

/// Show index and service statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, state: &CampusState) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = state.stats()?;
        println!("{}", self.render(&stats)?);
        Ok(())
    }

    fn render(&self, stats: &ServiceStats) -> AppResult<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(stats)?);
        }

        let g = &stats.gateway;
        let mut out = format!(
            "Tasks indexed:      {}\n\
             Vocabulary size:    {}\n\
             Avg document len:   {:.2}\n\
             Knowledge entries:  {}\n\
             Provider:           {}\n\
             Retrieval mode:     {}\n\
             Generation calls:   {} ({} attempts, {} retries, {} timeouts, {} errors, {} exhausted)\n\
             Rate limiting:      {}",
            stats.tasks,
            stats.vocabulary,
            stats.avg_doc_len,
            stats.knowledge_entries,
            stats.provider,
            stats.retrieval_mode.as_str(),
            g.calls,
            g.attempts,
            g.retries,
            g.timeouts,
            g.errors,
            g.exhausted,
            if stats.rate_limit_enabled { "enabled" } else { "disabled" }
        );
        push_usage(&mut out, "chat", &stats.chat_clients);
        push_usage(&mut out, "search", &stats.search_clients);
        Ok(out)
    }
}

fn push_usage(out: &mut String, kind: &str, clients: &BTreeMap<String, ClientUsage>) {
    for (client, usage) in clients {
        out.push_str(&format!(
            "\n  {} {}: {}/{} used, {} remaining",
            kind, client, usage.current_requests, usage.limit, usage.remaining
        ));
    }
}
