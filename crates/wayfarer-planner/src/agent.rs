//! The planner as an A2A task handler

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use wayfarer_a2a::{AgentCard, AuthConfig, TaskHandler, TaskOutput, TaskRequest};

use crate::planner::TravelPlanner;

pub const AGENT_NAME: &str = "travel_planner";

pub fn agent_card(url: impl Into<String>) -> AgentCard {
    AgentCard {
        name: AGENT_NAME.to_string(),
        description: "Answers travel questions, consulting the weather agent when needed."
            .to_string(),
        url: url.into(),
        capabilities: vec!["plan_trip".to_string(), "travel_advice".to_string()],
        authentication: AuthConfig::default(),
    }
}

/// Task prompt is the travel question; `data` carries the full answer
pub struct PlannerAgent {
    planner: Arc<TravelPlanner>,
}

impl PlannerAgent {
    pub fn new(planner: Arc<TravelPlanner>) -> Self {
        Self { planner }
    }
}

#[async_trait]
impl TaskHandler for PlannerAgent {
    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput> {
        let answer = self.planner.plan_trip(&request.prompt).await?;
        Ok(TaskOutput {
            text: answer.answer.clone(),
            data: Some(serde_json::to_value(&answer)?),
        })
    }
}
