//! Model-backed [`DecidesToolUse`]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::debug;

use wayfarer_core::ToolDefinition;
use wayfarer_core::providers::{ChatBlock, ChatMessage, ChatRole, LlmProvider};

use crate::decider::{DecidesToolUse, Decision, ToolCall, ToolOutcome};

const DECIDE_PROMPT: &str = "You are a travel planner. When answering the user's question \
    depends on the weather at their destination, you must call the get_weather tool once with \
    the destination city. Otherwise answer the question directly and briefly.";

const COMPOSE_PROMPT: &str = "Act as a Travel Advisor. Based on the user's question and the \
    weather tool result, answer the question and provide clothing and travel recommendations. \
    Do NOT use asterisks for bolding. Instead, put the topic at the start of the line, followed \
    by a relevant emoji, then the description. Use clear headings (using ###). If the tool \
    result is an error, say that weather information is unavailable and give general advice.";

/// Delegates both decisions to a hosted model
pub struct LlmDecider {
    provider: Arc<dyn LlmProvider>,
}

impl LlmDecider {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DecidesToolUse for LlmDecider {
    fn name(&self) -> &str {
        self.provider.provider_name()
    }

    async fn decide(&self, query: &str, tools: &[ToolDefinition]) -> Result<Decision> {
        let response = self
            .provider
            .chat(&[ChatMessage::user(query)], tools, DECIDE_PROMPT)
            .await?;
        debug!(
            "{} decide: stop={:?} tokens={}/{}",
            self.provider.model(),
            response.stop_reason,
            response.usage.input_tokens,
            response.usage.output_tokens
        );

        if let Some((id, name, input)) = response.first_tool_call() {
            return Ok(Decision::UseTool(ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            }));
        }

        let text = response.text();
        if text.trim().is_empty() {
            return Err(anyhow!("Model returned neither text nor a tool call"));
        }
        Ok(Decision::Answer(text))
    }

    async fn compose(&self, query: &str, call: &ToolCall, outcome: &ToolOutcome) -> Result<String> {
        let content = match outcome {
            ToolOutcome::Output(output) => output.clone(),
            ToolOutcome::Unavailable(reason) => {
                format!("ERROR: weather service unavailable: {}", reason)
            }
        };
        let messages = [
            ChatMessage::user(query),
            ChatMessage::blocks(
                ChatRole::Assistant,
                vec![ChatBlock::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                }],
            ),
            ChatMessage::blocks(
                ChatRole::User,
                vec![ChatBlock::ToolResult {
                    tool_call_id: call.id.clone(),
                    name: call.name.clone(),
                    content,
                }],
            ),
        ];

        let response = self.provider.chat(&messages, &[], COMPOSE_PROMPT).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(anyhow!("Model returned an empty answer"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;
    use wayfarer_core::providers::{
        ChatMessageContent, ChatResponse, ChatResponseBlock, ChatUsage, StopReason,
    };

    /// Replays canned responses and records what it was sent
    struct ScriptedProvider {
        responses: Mutex<VecDeque<ChatResponse>>,
        calls: Mutex<Vec<(Vec<ChatMessage>, usize, String)>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            tools: &[ToolDefinition],
            system: &str,
        ) -> Result<ChatResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), tools.len(), system.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("script exhausted"))
        }
    }

    fn text(text: &str) -> ChatResponse {
        ChatResponse {
            blocks: vec![ChatResponseBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: StopReason::EndTurn,
            usage: ChatUsage::default(),
        }
    }

    fn tool_call(location: &str) -> ChatResponse {
        ChatResponse {
            blocks: vec![ChatResponseBlock::ToolCall {
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                input: json!({ "location": location }),
            }],
            stop_reason: StopReason::ToolUse,
            usage: ChatUsage::default(),
        }
    }

    fn weather_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".to_string(),
            description: "weather".to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn test_decide_maps_tool_call() {
        let provider = ScriptedProvider::new(vec![tool_call("London")]);
        let decider = LlmDecider::new(provider.clone());

        let decision = decider
            .decide("Umbrella for London?", &[weather_tool()])
            .await
            .unwrap();
        assert_eq!(
            decision,
            Decision::UseTool(ToolCall {
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                input: json!({"location": "London"}),
            })
        );

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 1);
        assert_eq!(calls[0].2, DECIDE_PROMPT);
    }

    #[tokio::test]
    async fn test_decide_maps_text() {
        let provider = ScriptedProvider::new(vec![text("Paris.")]);
        let decision = LlmDecider::new(provider)
            .decide("What is the capital of France?", &[weather_tool()])
            .await
            .unwrap();
        assert_eq!(decision, Decision::Answer("Paris.".to_string()));
    }

    #[tokio::test]
    async fn test_decide_empty_response_is_error() {
        let provider = ScriptedProvider::new(vec![text("  ")]);
        let result = LlmDecider::new(provider).decide("hello", &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_compose_sends_tool_result() {
        let provider = ScriptedProvider::new(vec![text("### Rain gear\nTake an umbrella.")]);
        let decider = LlmDecider::new(provider.clone());
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            input: json!({"location": "London"}),
        };

        let answer = decider
            .compose(
                "Umbrella for London?",
                &call,
                &ToolOutcome::Output(r#"{"found":true}"#.to_string()),
            )
            .await
            .unwrap();
        assert!(answer.contains("umbrella"));

        let calls = provider.calls.lock().unwrap();
        let (messages, tool_count, system) = &calls[0];
        assert_eq!(*tool_count, 0);
        assert_eq!(system, COMPOSE_PROMPT);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::Assistant);
        match &messages[2].content {
            ChatMessageContent::Blocks(blocks) => match &blocks[0] {
                ChatBlock::ToolResult {
                    tool_call_id,
                    content,
                    ..
                } => {
                    assert_eq!(tool_call_id, "call_1");
                    assert_eq!(content, r#"{"found":true}"#);
                }
                other => panic!("unexpected block: {:?}", other),
            },
            ChatMessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[tokio::test]
    async fn test_compose_reports_unavailable_to_model() {
        let provider = ScriptedProvider::new(vec![text("Weather is unavailable right now.")]);
        let decider = LlmDecider::new(provider.clone());
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            input: json!({"location": "London"}),
        };

        decider
            .compose(
                "Umbrella?",
                &call,
                &ToolOutcome::Unavailable("connection refused".to_string()),
            )
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        match &calls[0].0[2].content {
            ChatMessageContent::Blocks(blocks) => match &blocks[0] {
                ChatBlock::ToolResult { content, .. } => {
                    assert!(content.starts_with("ERROR:"));
                    assert!(content.contains("connection refused"));
                }
                other => panic!("unexpected block: {:?}", other),
            },
            ChatMessageContent::Text(_) => panic!("expected blocks"),
        }
    }
}
