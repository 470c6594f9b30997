//! wayfarer-planner: the travel planner agent
//!
//! Answers free-text travel questions. Whether a question needs the weather,
//! and how the final answer is worded, is delegated to a [`DecidesToolUse`]
//! implementation: a hosted model ([`LlmDecider`]) or a deterministic keyword
//! matcher ([`KeywordDecider`]).

pub mod agent;
pub mod decider;
pub mod error;
pub mod http;
pub mod llm;
pub mod planner;

pub use agent::{PlannerAgent, agent_card};
pub use decider::{DecidesToolUse, Decision, KeywordDecider, ToolCall, ToolOutcome};
pub use error::PlannerError;
pub use llm::LlmDecider;
pub use planner::{TravelAdvice, TravelAnswer, TravelPlanner};
