//! Search command handler.

use campus_core::AppResult;
use campus_search::SearchHit;
use clap::Args;

use crate::state::CampusState;

/// Rank tasks by relevance to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Free-text query (Chinese, English or mixed)
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub fn execute(&self, state: &CampusState, client: &str) -> AppResult<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search options: {:?}", self);

        let hits = state.search(client, &self.query, self.top_n)?;
        println!("{}", self.render(&hits)?);
        Ok(())
    }

    fn render(&self, hits: &[SearchHit]) -> AppResult<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(hits)?);
        }

        if hits.is_empty() {
            return Ok(format!("No tasks match '{}'", self.query));
        }

        let lines: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "{:>2}. [{}] {}  score={:.4}  ({:.4}, {:.4})",
                    i + 1,
                    hit.task_id,
                    hit.title,
                    hit.score,
                    hit.lat,
                    hit.lng
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(json: bool) -> SearchCommand {
        SearchCommand {
            query: "图书馆".to_string(),
            top_n: None,
            json,
        }
    }

    fn hit() -> SearchHit {
        SearchHit {
            task_id: "T001".to_string(),
            title: "图书馆文献检索".to_string(),
            score: 1.2345,
            lat: 22.28,
            lng: 114.14,
        }
    }

    #[test]
    fn test_render_text() {
        let out = command(false).render(&[hit()]).unwrap();
        assert_eq!(out, " 1. [T001] 图书馆文献检索  score=1.2345  (22.2800, 114.1400)");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(command(false).render(&[]).unwrap(), "No tasks match '图书馆'");
    }

    #[test]
    fn test_render_json() {
        let out = command(true).render(&[hit()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["task_id"], "T001");
        assert_eq!(value[0]["score"], 1.2345);
    }
}
