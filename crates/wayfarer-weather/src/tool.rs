//! `get_weather` tool, local and remote

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use wayfarer_a2a::{A2aClient, AgentEndpoint, RemoteAgentTool};
use wayfarer_core::tools::{ToolHandler, json_schema, required_str};

use crate::lookup::{WeatherQuery, get_weather};

pub const TOOL_NAME: &str = "get_weather";

const DESCRIPTION: &str = "Get the weather forecast for a city. Returns JSON with `found`, \
     and when found the `condition`, `temperature_c` and `forecast`; otherwise a `message`.";

const MAX_LOCATION_LEN: usize = 200;

fn input_schema() -> Value {
    json_schema(
        serde_json::json!({
            "location": {
                "type": "string",
                "description": "City name (e.g. 'London', 'New York')"
            },
            "date": {
                "type": "string",
                "description": "Day of the trip (e.g. 'tomorrow', 'Sunday')"
            }
        }),
        vec!["location"],
    )
}

/// Parse tool input into a query
pub fn parse_query(input: &Value) -> Result<WeatherQuery> {
    let location = required_str(input, "location")?;
    if location.len() > MAX_LOCATION_LEN {
        return Err(anyhow!(
            "Location too long (max {} characters)",
            MAX_LOCATION_LEN
        ));
    }
    let date = input
        .get("date")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Ok(WeatherQuery {
        location: location.to_string(),
        date,
    })
}

/// In-process weather lookup
pub struct GetWeatherTool;

#[async_trait]
impl ToolHandler for GetWeatherTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        input_schema()
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let query = parse_query(&input)?;
        debug!("Getting weather for: {} ({:?})", query.location, query.date);
        let result = get_weather(&query);
        Ok(serde_json::to_string(&result)?)
    }
}

/// `get_weather` answered by a remote weather agent
pub fn remote_weather_tool(client: A2aClient, peer: AgentEndpoint) -> RemoteAgentTool {
    RemoteAgentTool::new(client, peer, TOOL_NAME, DESCRIPTION, input_schema(), "location")
}
