//! Canned weather lookup

use serde::{Deserialize, Serialize};

/// Canned conditions for one city
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannedWeather {
    pub condition: &'static str,
    pub temperature_c: f64,
    pub forecast: &'static str,
}

/// Cities the weather agent knows about, keyed by normalized name
pub const KNOWN_LOCATIONS: &[(&str, CannedWeather)] = &[
    (
        "london",
        CannedWeather {
            condition: "Rainy",
            temperature_c: 12.0,
            forecast: "Light rain through the afternoon, clearing by evening.",
        },
    ),
    (
        "tokyo",
        CannedWeather {
            condition: "Sunny",
            temperature_c: 24.0,
            forecast: "Clear skies all day with a light breeze.",
        },
    ),
    (
        "new york",
        CannedWeather {
            condition: "Cloudy",
            temperature_c: 18.0,
            forecast: "Overcast morning with sunny spells later in the day.",
        },
    ),
    (
        "paris",
        CannedWeather {
            condition: "Partly cloudy",
            temperature_c: 16.0,
            forecast: "Mild with occasional sunshine and a small chance of showers.",
        },
    ),
    (
        "sydney",
        CannedWeather {
            condition: "Sunny",
            temperature_c: 27.0,
            forecast: "Hot and dry with a high UV index.",
        },
    ),
];

/// A request for the weather at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub location: String,
    /// Day the caller asked about; canned data is the same for every day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl WeatherQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            date: None,
        }
    }
}

/// Outcome of a lookup. `found == false` is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub found: bool,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WeatherResult {
    fn found(location: String, canned: &CannedWeather) -> Self {
        Self {
            found: true,
            location,
            condition: Some(canned.condition.to_string()),
            temperature_c: Some(canned.temperature_c),
            forecast: Some(canned.forecast.to_string()),
            message: None,
        }
    }

    fn not_found(location: String, message: String) -> Self {
        Self {
            found: false,
            location,
            condition: None,
            temperature_c: None,
            forecast: None,
            message: Some(message),
        }
    }

    /// One-line description, e.g. `Weather in London: Rainy, 12°C. ...`
    pub fn summary(&self) -> String {
        match (&self.condition, self.temperature_c, &self.forecast) {
            (Some(condition), Some(temp), Some(forecast)) if self.found => format!(
                "Weather in {}: {}, {:.0}°C. {}",
                self.location, condition, temp, forecast
            ),
            _ => self
                .message
                .clone()
                .unwrap_or_else(|| format!("No weather information for '{}'.", self.location)),
        }
    }

    /// Whether rain or showers are expected
    pub fn expects_rain(&self) -> bool {
        let mentions = |s: &Option<String>| {
            s.as_deref()
                .map(|s| {
                    let s = s.to_lowercase();
                    s.contains("rain") || s.contains("shower")
                })
                .unwrap_or(false)
        };
        self.found && (mentions(&self.condition) || mentions(&self.forecast))
    }
}

/// Lowercase and collapse whitespace so "  New   York " matches "new york"
pub fn normalize_location(location: &str) -> String {
    location
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Find a known city mentioned anywhere in free text
pub fn find_known_location(text: &str) -> Option<&'static str> {
    let words: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let haystack = format!(" {} ", normalize_location(&words));
    KNOWN_LOCATIONS
        .iter()
        .map(|(name, _)| *name)
        .find(|name| haystack.contains(&format!(" {} ", name)))
}

/// Look up the canned weather for a location
pub fn get_weather(query: &WeatherQuery) -> WeatherResult {
    let location = query.location.trim().to_string();
    if location.is_empty() {
        return WeatherResult::not_found(location, "No location given.".to_string());
    }

    let key = normalize_location(&location);
    match KNOWN_LOCATIONS.iter().find(|(name, _)| *name == key) {
        Some((_, canned)) => WeatherResult::found(location, canned),
        None => {
            let message = format!("Weather information for '{}' is not available.", location);
            WeatherResult::not_found(location, message)
        }
    }
}
