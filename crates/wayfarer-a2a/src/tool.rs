//! Expose a peer A2A agent as a local tool

use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use wayfarer_core::tools::ToolHandler;

use crate::client::{A2aClient, AgentEndpoint};
use crate::protocol::TaskStatus;

/// How long to wait on the peer, and how often to check
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Tool whose calls are forwarded to a peer agent as A2A tasks.
///
/// The tool input becomes the task context; `prompt_field` names the input
/// field used as the task prompt. The peer's structured `data` is returned
/// as JSON when present, its text result otherwise.
pub struct RemoteAgentTool {
    client: A2aClient,
    peer: AgentEndpoint,
    name: String,
    description: String,
    input_schema: Value,
    prompt_field: String,
    wait: WaitPolicy,
}

impl RemoteAgentTool {
    pub fn new(
        client: A2aClient,
        peer: AgentEndpoint,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        prompt_field: impl Into<String>,
    ) -> Self {
        Self {
            client,
            peer,
            name: name.into(),
            description: description.into(),
            input_schema,
            prompt_field: prompt_field.into(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn peer(&self) -> &AgentEndpoint {
        &self.peer
    }
}

#[async_trait]
impl ToolHandler for RemoteAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let prompt = input
            .get(&self.prompt_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Missing '{}' parameter", self.prompt_field))?
            .to_string();

        debug!("Forwarding {} to agent '{}' at {}", self.name, self.peer.name, self.peer.url);

        let task = self
            .client
            .submit_and_wait(
                &self.peer,
                &prompt,
                input,
                self.wait.poll_interval,
                self.wait.timeout,
            )
            .await?;

        match task.status {
            TaskStatus::Completed => {
                info!("Agent '{}' completed task {}", self.peer.name, task.task_id);
                match (task.data, task.result) {
                    (Some(data), _) => Ok(data.to_string()),
                    (None, Some(text)) => Ok(text),
                    (None, None) => Err(anyhow!(
                        "Agent '{}' completed task {} without a result",
                        self.peer.name,
                        task.task_id
                    )),
                }
            }
            status => Err(anyhow!(
                "Agent '{}' task {} {}: {}",
                self.peer.name,
                task.task_id,
                status,
                task.result.unwrap_or_default()
            )),
        }
    }
}
