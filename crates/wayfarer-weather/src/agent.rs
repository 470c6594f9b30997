//! The weather agent as an A2A task handler

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use wayfarer_a2a::{AgentCard, AuthConfig, TaskHandler, TaskOutput, TaskRequest};

use crate::lookup::{WeatherQuery, find_known_location, get_weather};
use crate::tool::TOOL_NAME;

pub const AGENT_NAME: &str = "weather_agent";

/// Card advertised at `/.well-known/agent.json`
pub fn agent_card(url: impl Into<String>) -> AgentCard {
    AgentCard {
        name: AGENT_NAME.to_string(),
        description: "Provides weather forecasts for a fixed set of cities.".to_string(),
        url: url.into(),
        capabilities: vec![TOOL_NAME.to_string()],
        authentication: AuthConfig::default(),
    }
}

/// Answers weather tasks from the canned table.
///
/// Callers normally pass `{"location": ..., "date": ...}` as task context.
/// Without one, a known city named in the prompt is used, and failing that
/// the whole prompt is treated as the location.
#[derive(Debug, Default)]
pub struct WeatherAgent;

impl WeatherAgent {
    fn query_for(request: &TaskRequest) -> WeatherQuery {
        let context_str = |key: &str| {
            request
                .context
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let location = context_str("location").unwrap_or_else(|| {
            find_known_location(&request.prompt)
                .map(str::to_string)
                .unwrap_or_else(|| request.prompt.trim().to_string())
        });

        WeatherQuery {
            location,
            date: context_str("date"),
        }
    }
}

#[async_trait]
impl TaskHandler for WeatherAgent {
    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput> {
        let query = Self::query_for(&request);
        debug!("Weather task for '{}'", query.location);

        let result = get_weather(&query);
        info!(
            "Weather lookup for '{}': {}",
            result.location,
            if result.found { "found" } else { "not found" }
        );

        Ok(TaskOutput {
            text: result.summary(),
            data: Some(serde_json::to_value(&result)?),
        })
    }
}
