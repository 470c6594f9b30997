//! A2A client: sends tasks to peer agents

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::protocol::*;

/// Address and credentials of a peer agent
#[derive(Clone)]
pub struct AgentEndpoint {
    pub name: String,
    pub url: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for AgentEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEndpoint")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AgentEndpoint {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// A2A client for communicating with peer agents
#[derive(Clone)]
pub struct A2aClient {
    http: Client,
}

impl A2aClient {
    /// Create a client whose individual HTTP requests time out after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }

    fn authorize(req: RequestBuilder, peer: &AgentEndpoint) -> RequestBuilder {
        match &peer.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    /// Fetch an agent's capability card
    pub async fn fetch_agent_card(&self, peer: &AgentEndpoint) -> Result<AgentCard> {
        let url = peer.endpoint(AGENT_CARD_PATH);
        debug!("Fetching agent card from {}", url);

        let resp = Self::authorize(self.http.get(&url), peer)
            .send()
            .await
            .with_context(|| format!("Failed to connect to agent at {}", url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Agent card request failed: HTTP {}", resp.status()));
        }

        let card: AgentCard = resp.json().await.context("Failed to parse agent card")?;

        info!(
            "Fetched agent card: {} ({} capabilities)",
            card.name,
            card.capabilities.len()
        );
        Ok(card)
    }

    /// Submit a task to a peer agent
    pub async fn submit_task(
        &self,
        peer: &AgentEndpoint,
        prompt: &str,
        context: Value,
    ) -> Result<TaskResponse> {
        let url = peer.endpoint(TASKS_PATH);
        debug!("Submitting task to {} ({})", peer.name, url);

        let request = TaskRequest {
            prompt: prompt.to_string(),
            context,
        };

        let resp = Self::authorize(self.http.post(&url).json(&request), peer)
            .send()
            .await
            .with_context(|| format!("Failed to submit task to {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Task submission failed: HTTP {}: {}", status, body));
        }

        let task: TaskResponse = resp.json().await.context("Failed to parse task response")?;

        debug!("Task submitted: {} (status: {})", task.task_id, task.status);
        Ok(task)
    }

    /// Poll task status
    pub async fn get_task_status(
        &self,
        peer: &AgentEndpoint,
        task_id: &str,
    ) -> Result<TaskResponse> {
        let url = peer.endpoint(&format!("{}/{}", TASKS_PATH, task_id));

        let resp = Self::authorize(self.http.get(&url), peer)
            .send()
            .await
            .with_context(|| format!("Failed to poll task {} at {}", task_id, url))?;

        if !resp.status().is_success() {
            return Err(anyhow!(
                "Task status request failed: HTTP {}",
                resp.status()
            ));
        }

        resp.json().await.context("Failed to parse task status")
    }

    /// Cancel a task
    pub async fn cancel_task(&self, peer: &AgentEndpoint, task_id: &str) -> Result<TaskResponse> {
        let url = peer.endpoint(&format!("{}/{}", TASKS_PATH, task_id));

        let resp = Self::authorize(self.http.delete(&url), peer)
            .send()
            .await
            .with_context(|| format!("Failed to cancel task {} at {}", task_id, url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Task cancellation failed: HTTP {}", resp.status()));
        }

        info!("Task {} cancelled", task_id);
        resp.json().await.context("Failed to parse task status")
    }

    /// Submit a task and poll until it reaches a terminal status
    pub async fn submit_and_wait(
        &self,
        peer: &AgentEndpoint,
        prompt: &str,
        context: Value,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TaskResponse> {
        let task = self.submit_task(peer, prompt, context).await?;
        if task.status.is_terminal() {
            return Ok(task);
        }

        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if tokio::time::Instant::now() > deadline {
                if let Err(e) = self.cancel_task(peer, &task.task_id).await {
                    warn!("Failed to cancel timed-out task {}: {:#}", task.task_id, e);
                }
                return Err(anyhow!(
                    "Task {} timed out after {:?}",
                    task.task_id,
                    timeout
                ));
            }

            tokio::time::sleep(poll_interval).await;

            let status = self.get_task_status(peer, &task.task_id).await?;
            if status.status.is_terminal() {
                debug!("Task {} finished: {}", status.task_id, status.status);
                return Ok(status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_peer(url: &str) -> AgentEndpoint {
        AgentEndpoint {
            name: "weather_agent".to_string(),
            url: url.to_string(),
            token: None,
        }
    }

    fn client() -> A2aClient {
        A2aClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let peer = unreachable_peer("http://localhost:8001/");
        assert_eq!(
            peer.endpoint(AGENT_CARD_PATH),
            "http://localhost:8001/.well-known/agent.json"
        );
        assert_eq!(peer.endpoint(TASKS_PATH), "http://localhost:8001/a2a/tasks");
    }

    #[test]
    fn test_endpoint_debug_redacts_token() {
        let peer = AgentEndpoint {
            name: "weather_agent".to_string(),
            url: "http://localhost:8001".to_string(),
            token: Some("secret".to_string()),
        };
        let debug = format!("{:?}", peer);
        assert!(debug.contains("weather_agent"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_fetch_agent_card_connection_refused() {
        let result = client()
            .fetch_agent_card(&unreachable_peer("http://127.0.0.1:1"))
            .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to connect"));
    }

    #[tokio::test]
    async fn test_submit_task_connection_refused() {
        let result = client()
            .submit_task(
                &unreachable_peer("http://127.0.0.1:1"),
                "weather in London",
                serde_json::json!({}),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_task_status_connection_refused() {
        let result = client()
            .get_task_status(&unreachable_peer("http://127.0.0.1:1"), "task-123")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_task_connection_refused() {
        let result = client()
            .cancel_task(&unreachable_peer("http://127.0.0.1:1"), "task-123")
            .await;
        assert!(result.is_err());
    }
}
