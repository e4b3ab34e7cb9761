//! Answer generation for campus chat.
//!
//! This crate provides a backend-agnostic abstraction for producing structured
//! answers from a system prompt and a user prompt, plus a gateway that bounds
//! every attempt with a timeout and retries failures with backoff.
//!
//! # Backends
//! - **Mock**: keyword-selected canned answers with seeded delay and failure injection
//! - **Scripted**: a queue of predetermined outcomes for tests
//!
//! # Example
//! ```no_run
//! use campus_core::config::{GeneratorConfig, RetryConfig, TimeoutConfig};
//! use campus_llm::{create_generator, GenerationRequest, LlmGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = create_generator(&GeneratorConfig::default())?;
//! let gateway = LlmGateway::from_config(
//!     generator,
//!     &RetryConfig::default(),
//!     &TimeoutConfig::default(),
//! );
//! let request = GenerationRequest::new("You are a campus assistant.", "图书馆在哪里？");
//! let response = gateway.generate(&request).await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod gateway;
pub mod mock;
pub mod scripted;
pub mod types;

// Re-export main types
pub use client::{AnswerGenerator, GenerationRequest};
pub use factory::create_generator;
pub use gateway::{GatewayStats, LlmGateway, RetryPolicy};
pub use mock::MockGenerator;
pub use scripted::{ScriptStep, ScriptedGenerator};
pub use types::{Confidence, GenerationResponse};
