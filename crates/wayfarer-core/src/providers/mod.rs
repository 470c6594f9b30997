//! LLM provider abstraction layer
//!
//! Agents talk to a hosted model through the [`LlmProvider`] trait. The only
//! concrete backend is Google Gemini; tests substitute their own providers.

pub mod google;
pub mod types;

pub use google::GoogleProvider;
pub use types::{
    ChatBlock, ChatMessage, ChatMessageContent, ChatResponse, ChatResponseBlock, ChatRole,
    ChatUsage, LlmProvider, StopReason,
};
