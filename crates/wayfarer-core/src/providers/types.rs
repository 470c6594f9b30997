//! Provider-agnostic types for LLM-backed agents

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ToolDefinition;

/// Provider-agnostic chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: ChatMessageContent,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Content of a chat message, either plain text or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Blocks(Vec<ChatBlock>),
}

/// A single block within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatBlock {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

/// Provider-agnostic response from an LLM
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub blocks: Vec<ChatResponseBlock>,
    pub stop_reason: StopReason,
    pub usage: ChatUsage,
}

/// A block in the response
#[derive(Debug, Clone)]
pub enum ChatResponseBlock {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Unknown,
}

/// Token usage from a single API call
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait that all LLM providers implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "google")
    fn provider_name(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.5-flash")
    fn model(&self) -> &str;

    /// Send a chat request with optional tools and system prompt
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        system: &str,
    ) -> Result<ChatResponse>;
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatMessageContent::Text(text.into()),
        }
    }

    pub fn blocks(role: ChatRole, blocks: Vec<ChatBlock>) -> Self {
        Self {
            role,
            content: ChatMessageContent::Blocks(blocks),
        }
    }
}

impl ChatResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ChatResponseBlock::Text { text } => Some(text.as_str()),
                ChatResponseBlock::ToolCall { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// First tool call the model asked for, if any
    pub fn first_tool_call(&self) -> Option<(&str, &str, &Value)> {
        self.blocks.iter().find_map(|b| match b {
            ChatResponseBlock::ToolCall { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            ChatResponseBlock::Text { .. } => None,
        })
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl StopReason {
    /// Whether the model wants to call tools
    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse)
    }
}
