//! Configuration loading from `wayfarer.toml`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CONFIG_DIR: &str = "wayfarer";
pub const CONFIG_FILE: &str = "wayfarer.toml";

/// Environment variables that `${VAR}` in the config file may reference.
/// Anything else is left verbatim.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GOOGLE_AI_API_KEY",
    "WAYFARER_A2A_TOKEN",
    "WEATHER_AGENT_URL",
    "HOME",
    "USER",
];

/// Written by `wayfarer init`
pub const DEFAULT_CONFIG: &str = r#"# Wayfarer configuration

[weather_agent]
bind = "127.0.0.1:8001"
name = "weather_agent"
# public_url = "http://weather.example.com"
# auth_token = "${WAYFARER_A2A_TOKEN}"

[planner]
bind = "127.0.0.1:8000"
weather_agent_url = "http://127.0.0.1:8001"
# weather_agent_token = "${WAYFARER_A2A_TOKEN}"
poll_interval_ms = 200
timeout_secs = 30
# "keyword" works offline; "llm" needs an API key below
decider = "keyword"
# auth_token = "${WAYFARER_A2A_TOKEN}"

[llm]
provider = "google"
model = "gemini-2.5-flash"
api_key = "${GEMINI_API_KEY}"
# base_url = "https://generativelanguage.googleapis.com/v1beta"

[logging]
level = "info"
"#;

/// `~/.config/wayfarer/wayfarer.toml` on unix
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("No platform config directory"))?;
    Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Replace `${VAR}` with the variable's value for allowlisted names.
/// Unset variables expand to the empty string.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let name = &after[..end];
        if ALLOWED_ENV_VARS.contains(&name) {
            result.push_str(&std::env::var(name).unwrap_or_default());
        } else {
            warn!("Config references ${{{}}} which is not an allowed variable", name);
            result.push_str(&rest[start..start + 2 + end + 1]);
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WayfarerConfig {
    pub weather_agent: WeatherAgentConfig,
    pub planner: PlannerConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherAgentConfig {
    pub bind: String,
    pub name: String,
    /// URL advertised in the agent card; defaults to `http://<bind>`
    pub public_url: Option<String>,
    pub auth_token: Option<String>,
}

impl Default for WeatherAgentConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8001".to_string(),
            name: "weather_agent".to_string(),
            public_url: None,
            auth_token: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub bind: String,
    pub public_url: Option<String>,
    pub weather_agent_url: String,
    pub weather_agent_token: Option<String>,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    pub decider: DeciderKind,
    pub auth_token: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            public_url: None,
            weather_agent_url: "http://127.0.0.1:8001".to_string(),
            weather_agent_token: None,
            poll_interval_ms: 200,
            timeout_secs: 30,
            decider: DeciderKind::Keyword,
            auth_token: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeciderKind {
    /// Hosted model decides and composes
    Llm,
    /// Deterministic keyword matching, no network
    #[default]
    Keyword,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Google,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Supports `${GEMINI_API_KEY}`; empty falls back to the environment
    pub api_key: String,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            model: "gemini-2.5-flash".to_string(),
            api_key: String::new(),
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Configured key, else `GEMINI_API_KEY`, else `GOOGLE_AI_API_KEY`
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{} must be an http(s) URL, got {}", field, value);
    }
    Ok(())
}

impl WayfarerConfig {
    /// Parse TOML, expanding allowlisted `${VAR}` references first
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = expand_env_vars(toml_str);
        toml::from_str(&expanded).context("Failed to parse config")
    }

    /// Load from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_http_url("planner.weather_agent_url", &self.planner.weather_agent_url)?;
        for (field, value) in [
            ("weather_agent.public_url", &self.weather_agent.public_url),
            ("planner.public_url", &self.planner.public_url),
            ("llm.base_url", &self.llm.base_url),
        ] {
            if let Some(value) = value {
                check_http_url(field, value)?;
            }
        }

        if self.planner.poll_interval_ms == 0 {
            bail!("planner.poll_interval_ms must be greater than zero");
        }
        if self.planner.timeout_secs == 0 {
            bail!("planner.timeout_secs must be greater than zero");
        }
        if self.weather_agent.name.trim().is_empty() {
            bail!("weather_agent.name must not be empty");
        }
        if self.planner.decider == DeciderKind::Llm && self.llm.resolved_api_key().is_none() {
            bail!("planner.decider = \"llm\" needs llm.api_key or GEMINI_API_KEY");
        }
        Ok(())
    }
}

/// Write [`DEFAULT_CONFIG`] to `path`, creating parent directories
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Treat blank tokens (e.g. an unset `${VAR}`) as absent
pub fn non_empty(token: &Option<String>) -> Option<String> {
    token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
