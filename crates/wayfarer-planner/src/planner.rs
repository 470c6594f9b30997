//! The travel planner: at most one weather lookup per question

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use wayfarer_core::ToolExecutor;
use wayfarer_weather::WeatherResult;
use wayfarer_weather::tool::TOOL_NAME as WEATHER_TOOL;

use crate::decider::{DecidesToolUse, Decision, ToolCall, ToolOutcome};
use crate::error::PlannerError;

/// Appended to answers composed while the weather agent was unreachable
pub const WEATHER_UNAVAILABLE_NOTE: &str = "Note: weather information could not be retrieved.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelAnswer {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherResult>,
    #[serde(default)]
    pub weather_unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelAdvice {
    pub advice: String,
    pub weather: WeatherResult,
}

pub struct TravelPlanner {
    decider: Arc<dyn DecidesToolUse>,
    tools: Arc<dyn ToolExecutor>,
}

impl TravelPlanner {
    pub fn new(decider: Arc<dyn DecidesToolUse>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self { decider, tools }
    }

    /// Answer a free-text travel question.
    ///
    /// The decider either answers outright or names one tool call. That call
    /// is made once; if it fails the answer is still composed, flagged with
    /// `weather_unavailable`. No retries.
    pub async fn plan_trip(&self, query: &str) -> Result<TravelAnswer, PlannerError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PlannerError::InvalidQuery("query is empty".to_string()));
        }

        let tools = self.tools.list_tools();
        let decision = self
            .decider
            .decide(query, &tools)
            .await
            .map_err(PlannerError::Decider)?;

        let call = match decision {
            Decision::Answer(answer) => {
                debug!("{} decider answered directly", self.decider.name());
                return Ok(TravelAnswer {
                    answer,
                    weather: None,
                    weather_unavailable: false,
                });
            }
            Decision::UseTool(call) => call,
        };

        info!("Calling tool {} with {}", call.name, call.input);
        let outcome = match self.tools.execute(&call.name, call.input.clone()).await {
            Ok(output) => ToolOutcome::Output(output),
            Err(e) => {
                warn!("Tool {} failed, answering without it: {:#}", call.name, e);
                ToolOutcome::Unavailable(format!("{:#}", e))
            }
        };

        let weather = match &outcome {
            ToolOutcome::Output(output) if call.name == WEATHER_TOOL => {
                serde_json::from_str::<WeatherResult>(output)
                    .inspect_err(|e| warn!("Unparseable weather output: {}", e))
                    .ok()
            }
            _ => None,
        };
        let weather_unavailable = matches!(outcome, ToolOutcome::Unavailable(_));

        let mut answer = self
            .decider
            .compose(query, &call, &outcome)
            .await
            .map_err(PlannerError::Decider)?;
        if weather_unavailable {
            answer = format!("{}\n\n{}", answer.trim_end(), WEATHER_UNAVAILABLE_NOTE);
        }

        Ok(TravelAnswer {
            answer,
            weather,
            weather_unavailable,
        })
    }

    /// Clothing and travel advice for a destination.
    ///
    /// Unlike [`plan_trip`](Self::plan_trip) the weather is required here:
    /// an unknown destination is `NotFound` and an unreachable weather
    /// agent is `WeatherUnavailable`.
    pub async fn advise(&self, destination: &str) -> Result<TravelAdvice, PlannerError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PlannerError::InvalidQuery("destination is empty".to_string()));
        }

        let call = ToolCall {
            id: "advice-0".to_string(),
            name: WEATHER_TOOL.to_string(),
            input: json!({ "location": destination }),
        };
        let output = self
            .tools
            .execute(&call.name, call.input.clone())
            .await
            .map_err(|e| PlannerError::WeatherUnavailable(format!("{:#}", e)))?;
        let weather: WeatherResult = serde_json::from_str(&output).map_err(|e| {
            PlannerError::WeatherUnavailable(format!("unexpected weather response: {}", e))
        })?;
        if !weather.found {
            return Err(PlannerError::NotFound(destination.to_string()));
        }

        let query = format!(
            "I'm travelling to {}. What should I wear and pack?",
            destination
        );
        let advice = self
            .decider
            .compose(&query, &call, &ToolOutcome::Output(output))
            .await
            .map_err(PlannerError::Decider)?;

        Ok(TravelAdvice { advice, weather })
    }
}
