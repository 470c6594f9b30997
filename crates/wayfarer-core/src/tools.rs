//! Tool handlers and the registry agents dispatch through

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::ToolDefinition;

/// Executes tools by name on behalf of an agent
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, input: Value) -> Result<String>;
    fn list_tools(&self) -> Vec<ToolDefinition>;
}

/// A single callable capability
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, input: Value) -> Result<String>;

    /// Definition advertised to a model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Name-keyed set of tool handlers.
///
/// Ordered by name so tool listings sent to a model are stable between calls.
pub struct ToolRegistry {
    tools: BTreeMap<Arc<str>, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool handler, replacing any handler with the same name
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name: Arc<str> = Arc::from(handler.name());
        debug!("Registering tool: {}", name);
        if self.tools.insert(name.clone(), handler).is_some() {
            warn!("Tool {} was already registered and has been replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_name: &str, input: Value) -> Result<String> {
        debug!("Executing tool: {} with input: {}", tool_name, input);

        let handler = self
            .tools
            .get(tool_name)
            .ok_or_else(|| anyhow!("Unknown tool: {}", tool_name))?;

        match handler.execute(input).await {
            Ok(result) => {
                debug!("Tool {} succeeded", tool_name);
                Ok(result)
            }
            Err(e) => {
                warn!("Tool {} failed: {:#}", tool_name, e);
                Err(e)
            }
        }
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|handler| handler.definition()).collect()
    }
}

/// Build a JSON schema object for tool input
pub fn json_schema(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Read a required string parameter from tool input
pub fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing '{}' parameter", key))
}
