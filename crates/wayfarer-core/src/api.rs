//! Wire-level definitions shared between tools and providers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised to a language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}
