//! Deciding whether a question needs the weather
//!
//! The planner asks a [`DecidesToolUse`] implementation two things: which
//! tool, if any, a question needs, and how to word the final answer once the
//! tool has run. [`KeywordDecider`] answers both without a model.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

use wayfarer_core::ToolDefinition;
use wayfarer_weather::lookup::find_known_location;
use wayfarer_weather::tool::TOOL_NAME as WEATHER_TOOL;
use wayfarer_weather::WeatherResult;

/// A tool invocation chosen by the decider
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// What came back from the tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Raw tool output, JSON for `get_weather`
    Output(String),
    /// The tool could not be reached; carries the reason
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer directly, no tool needed
    Answer(String),
    /// Call exactly this tool, then compose
    UseTool(ToolCall),
}

#[async_trait]
pub trait DecidesToolUse: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Pick between a direct answer and a single tool call
    async fn decide(&self, query: &str, tools: &[ToolDefinition]) -> Result<Decision>;

    /// Word the final answer from the tool's outcome
    async fn compose(&self, query: &str, call: &ToolCall, outcome: &ToolOutcome) -> Result<String>;
}

const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "umbrella",
    "umbrellas",
    "rain",
    "raining",
    "rainy",
    "forecast",
    "temperature",
    "sunny",
    "snow",
    "snowing",
    "pack",
    "packing",
    "cold",
    "hot",
    "warm",
    "wear",
    "jacket",
    "coat",
];

const LOCATION_PREPOSITIONS: &[&str] = &["to", "in", "for", "at", "visiting"];

const DIRECT_ANSWER: &str = "I'm a travel planner running without a language model, so the one \
     thing I can look up is the weather at your destination. Try asking something like \
     \"I'm going to London tomorrow, do I need an umbrella?\"";

const ASK_FOR_CITY: &str =
    "Which city are you travelling to? Tell me and I'll check the weather there.";

/// Deterministic decider driven by keywords.
///
/// Weather-related words together with a place name trigger one
/// `get_weather` call; everything else gets a fixed reply.
#[derive(Debug, Default, Clone)]
pub struct KeywordDecider;

fn mentions_weather(query: &str) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|w| WEATHER_KEYWORDS.contains(&w.to_lowercase().as_str()))
}

/// Every run of capitalised words following "to", "in", "for"...
/// e.g. "to New York," gives "New York"
fn capitalised_phrases(query: &str) -> Vec<String> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut phrases = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if !LOCATION_PREPOSITIONS.contains(&token.to_lowercase().as_str()) {
            continue;
        }
        let mut words = Vec::new();
        for raw in &tokens[i + 1..] {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.chars().next().is_some_and(char::is_uppercase) {
                break;
            }
            words.push(word);
            if raw.ends_with(|c: char| !c.is_alphanumeric()) {
                break;
            }
        }
        if !words.is_empty() {
            phrases.push(words.join(" "));
        }
    }
    phrases
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Place named in a question, if any.
///
/// A known city wins over other capitalised words ("in December in Paris"
/// gives Paris); an unknown capitalised place is used only when no known
/// city is mentioned at all.
pub fn extract_location(query: &str) -> Option<String> {
    let phrases = capitalised_phrases(query);
    phrases
        .iter()
        .find_map(|phrase| find_known_location(phrase))
        .or_else(|| find_known_location(query))
        .map(title_case)
        .or_else(|| phrases.into_iter().next())
}

fn packing_advice(weather: &WeatherResult) -> &'static str {
    let temp = weather.temperature_c.unwrap_or_default();
    if weather.expects_rain() {
        "Yes, take an umbrella and a waterproof layer."
    } else if temp >= 25.0 {
        "No umbrella needed; pack light clothes and sunscreen."
    } else if temp < 10.0 {
        "No umbrella needed, but bring a warm coat."
    } else {
        "No umbrella needed; a light jacket should do."
    }
}

#[async_trait]
impl DecidesToolUse for KeywordDecider {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn decide(&self, query: &str, tools: &[ToolDefinition]) -> Result<Decision> {
        let has_weather_tool = tools.iter().any(|t| t.name == WEATHER_TOOL);
        if !has_weather_tool || !mentions_weather(query) {
            return Ok(Decision::Answer(DIRECT_ANSWER.to_string()));
        }

        Ok(match extract_location(query) {
            Some(location) => Decision::UseTool(ToolCall {
                id: "keyword-0".to_string(),
                name: WEATHER_TOOL.to_string(),
                input: json!({ "location": location }),
            }),
            None => Decision::Answer(ASK_FOR_CITY.to_string()),
        })
    }

    async fn compose(
        &self,
        _query: &str,
        call: &ToolCall,
        outcome: &ToolOutcome,
    ) -> Result<String> {
        let location = call
            .input
            .get("location")
            .and_then(|v| v.as_str())
            .unwrap_or("your destination");

        let output = match outcome {
            ToolOutcome::Output(output) => output,
            ToolOutcome::Unavailable(_) => {
                return Ok(format!(
                    "Without a forecast for {}, pack for changeable conditions, \
                     a compact umbrella included.",
                    location
                ));
            }
        };

        Ok(match serde_json::from_str::<WeatherResult>(output) {
            Ok(weather) if weather.found => {
                format!("{} {}", weather.summary(), packing_advice(&weather))
            }
            Ok(weather) => format!(
                "{} Pack for changeable conditions to be safe.",
                weather.summary()
            ),
            Err(_) => format!("Weather report for {}: {}", location, output),
        })
    }
}
