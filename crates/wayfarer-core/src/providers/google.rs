//! Google Gemini provider (`generateContent`)

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::types::*;
use crate::api::ToolDefinition;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini chat provider
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GoogleProvider {
    pub fn new(
        api_key: String,
        model: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        system: &str,
    ) -> Value {
        let contents: Vec<Value> = messages.iter().map(to_gemini_content).collect();

        let mut body = json!({ "contents": contents });

        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        if !tools.is_empty() {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }
}

fn to_gemini_content(msg: &ChatMessage) -> Value {
    let role = match msg.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    };

    let parts: Vec<Value> = match &msg.content {
        ChatMessageContent::Text(text) => vec![json!({ "text": text })],
        ChatMessageContent::Blocks(blocks) => blocks
            .iter()
            .map(|block| match block {
                ChatBlock::Text { text } => json!({ "text": text }),
                ChatBlock::ToolCall { name, input, .. } => {
                    json!({ "functionCall": { "name": name, "args": input } })
                }
                ChatBlock::ToolResult { name, content, .. } => json!({
                    "functionResponse": {
                        "name": name,
                        "response": { "content": content },
                    }
                }),
            })
            .collect(),
    };

    json!({ "role": role, "parts": parts })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn parse_response(data: GeminiResponse) -> Result<ChatResponse> {
    let candidate = data
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No candidates in Gemini response"))?;

    let mut blocks = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            blocks.push(ChatResponseBlock::Text { text });
        }
        if let Some(call) = part.function_call {
            blocks.push(ChatResponseBlock::ToolCall {
                id: uuid::Uuid::new_v4().to_string(),
                name: call.name,
                input: call.args.unwrap_or_else(|| json!({})),
            });
        }
    }

    let has_tool_call = blocks
        .iter()
        .any(|b| matches!(b, ChatResponseBlock::ToolCall { .. }));
    let stop_reason = match candidate.finish_reason.as_deref() {
        _ if has_tool_call => StopReason::ToolUse,
        Some("STOP") => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    };

    let usage = data
        .usage_metadata
        .map(|u| ChatUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        blocks,
        stop_reason,
        usage,
    })
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        system: &str,
    ) -> Result<ChatResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request_body(messages, tools, system);

        debug!(
            model = self.model.as_str(),
            messages = messages.len(),
            tools = tools.len(),
            "Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send Gemini request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini request failed with status {status}: {body}");
        }

        let data: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let parsed = parse_response(data)?;
        debug!(
            stop_reason = ?parsed.stop_reason,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Gemini generateContent response"
        );
        Ok(parsed)
    }
}
