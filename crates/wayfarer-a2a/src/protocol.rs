//! A2A (Agent-to-Agent) protocol types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path the agent card is served from
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";
/// Collection path for task submission
pub const TASKS_PATH: &str = "/a2a/tasks";

/// Agent Card: advertises capabilities at /.well-known/agent.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub authentication: AuthConfig,
}

/// Authentication schemes an agent accepts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub schemes: Vec<String>,
}

/// Task submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: Value,
}

/// Task status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: String,
    pub status: TaskStatus,
    /// Human-readable result, or the failure message for failed tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Structured result payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Submitted,
    Working,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Whether the task will not change status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_card_serialization() {
        let card = AgentCard {
            name: "weather_agent".to_string(),
            description: "Canned weather forecasts".to_string(),
            url: "http://localhost:8001".to_string(),
            capabilities: vec!["get_weather".to_string()],
            authentication: AuthConfig {
                schemes: vec!["bearer".to_string()],
            },
        };
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "weather_agent");
        assert_eq!(json["capabilities"][0], "get_weather");
        assert_eq!(json["authentication"]["schemes"][0], "bearer");
    }

    #[test]
    fn test_agent_card_without_authentication() {
        let json = r#"{"name":"a","description":"b","url":"http://x","capabilities":[]}"#;
        let card: AgentCard = serde_json::from_str(json).unwrap();
        assert!(card.authentication.schemes.is_empty());
    }

    #[test]
    fn test_task_status_terminal() {
        assert!(!TaskStatus::Submitted.is_terminal());
        assert!(!TaskStatus::Working.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert_eq!(TaskStatus::Working.to_string(), "working");
    }

    #[test]
    fn test_task_request_context_defaults_to_null() {
        let req: TaskRequest = serde_json::from_str(r#"{"prompt":"weather in Tokyo"}"#).unwrap();
        assert_eq!(req.prompt, "weather in Tokyo");
        assert!(req.context.is_null());
    }

    #[test]
    fn test_task_response_omits_empty_fields() {
        let resp = TaskResponse {
            task_id: "abc-123".to_string(),
            status: TaskStatus::Working,
            result: None,
            data: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "working");
        assert!(json.get("result").is_none());
        assert!(json.get("data").is_none());
        assert!(json.get("completed_at").is_none());
    }
}
