//! wayfarer-core: shared plumbing for Wayfarer agents
//!
//! Tool handlers and the registry that dispatches them, plus a
//! provider-agnostic LLM interface used by agents that delegate reasoning
//! to a hosted model.

pub mod api;
pub mod providers;
pub mod tools;

pub use api::ToolDefinition;
pub use providers::{ChatMessage, ChatResponse, GoogleProvider, LlmProvider};
pub use tools::{ToolExecutor, ToolHandler, ToolRegistry, json_schema};
