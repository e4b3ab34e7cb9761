//! Generation backend factory.
//!
//! Resolves the configured provider name to a backend implementation.

use std::sync::Arc;

use campus_core::config::GeneratorConfig;
use campus_core::{AppError, AppResult};

use crate::client::AnswerGenerator;
use crate::mock::MockGenerator;

/// Create the answer generator named by `config.provider`.
///
/// # Errors
/// Returns a configuration error if the provider is unknown.
pub fn create_generator(config: &GeneratorConfig) -> AppResult<Arc<dyn AnswerGenerator>> {
    match config.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::debug!(
                "Using mock generator (seed {}, failure rate {})",
                config.seed,
                config.failure_rate
            );
            Ok(Arc::new(MockGenerator::new(config.clone())))
        }
        other => Err(AppError::Config(format!(
            "Unknown generation provider: {}",
            other
        ))),
    }
}
