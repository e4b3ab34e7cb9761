//! Campus Tasks Core Library
//!
//! This crate provides the foundational utilities shared by every campus crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Shared domain types (`TaskInfo`, `ScoredChunk`)
//! - Per-client sliding-window rate limiting

pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use rate_limit::{ClientUsage, SlidingWindowLimiter};
pub use types::{ScoredChunk, TaskInfo};
