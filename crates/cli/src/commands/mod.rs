//! Command handlers for the campus CLI.

pub mod chat;
pub mod check;
pub mod search;
pub mod stats;

pub use chat::ChatCommand;
pub use check::CheckCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
