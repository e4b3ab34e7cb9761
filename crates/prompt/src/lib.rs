//! Prompt system for campus chat.
//!
//! This crate provides structured prompt management with:
//! - A built-in chat prompt (system instruction + user template)
//! - YAML prompt overrides under `.campus/prompts/`
//! - Handlebars template rendering
//! - Task and knowledge snippet context injection

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_chat_prompt, format_knowledge_context, format_user_prompt};
pub use defaults::{default_chat_prompt, CHAT_PROMPT_ID, NO_KNOWLEDGE_MARKER};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
