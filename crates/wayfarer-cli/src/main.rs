//! wayfarer: run the weather agent, the travel planner, or ask either one
//!
//! Usage:
//!   wayfarer weather-agent            serve the weather agent (A2A + GET /weather/{city})
//!   wayfarer planner                  serve the planner (A2A + POST /plan, /travel_advice)
//!   wayfarer weather London           local lookup, prints JSON
//!   wayfarer plan Do I need an umbrella in London?
//!   wayfarer init                     write a default config file

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use wayfarer_a2a::{A2aClient, A2aServer, AgentEndpoint, WaitPolicy, serve};
use wayfarer_core::{GoogleProvider, ToolRegistry};
use wayfarer_planner::{DecidesToolUse, KeywordDecider, LlmDecider, PlannerAgent, TravelPlanner};
use wayfarer_weather::{WeatherAgent, WeatherQuery, get_weather, remote_weather_tool};

use config::{DeciderKind, ProviderKind, WayfarerConfig, non_empty};

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "Weather agent and travel planner over A2A")]
struct Cli {
    /// Config file (default: ~/.config/wayfarer/wayfarer.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the weather agent
    WeatherAgent {
        /// Override weather_agent.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Serve the travel planner agent
    Planner {
        /// Override planner.bind
        #[arg(long)]
        bind: Option<String>,
        #[arg(long, value_enum)]
        decider: Option<DeciderKind>,
    },
    /// Look up the canned weather for a city
    Weather {
        #[arg(required = true)]
        city: Vec<String>,
    },
    /// Ask the planner a question, consulting the configured weather agent
    Plan {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, value_enum)]
        decider: Option<DeciderKind>,
        /// Print the full answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        init_logging("info", cli.verbose);
        let path = match cli.config {
            Some(path) => path,
            None => config::default_config_path()?,
        };
        config::init(&path, force)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut config = WayfarerConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging.level, cli.verbose);

    match &cli.command {
        Commands::Planner { decider: Some(d), .. } | Commands::Plan { decider: Some(d), .. } => {
            config.planner.decider = *d;
        }
        _ => {}
    }
    config.validate()?;

    match cli.command {
        Commands::WeatherAgent { bind } => run_weather_agent(&config, bind).await,
        Commands::Planner { bind, .. } => run_planner(&config, bind).await,
        Commands::Weather { city } => {
            let result = get_weather(&WeatherQuery::new(city.join(" ")));
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Plan { query, json, .. } => {
            let planner = build_planner(&config)?;
            let answer = planner.plan_trip(&query.join(" ")).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer);
            }
            Ok(())
        }
        Commands::Init { .. } => Ok(()),
    }
}

async fn run_weather_agent(config: &WayfarerConfig, bind: Option<String>) -> Result<()> {
    let settings = &config.weather_agent;
    let bind = bind.unwrap_or_else(|| settings.bind.clone());
    let url = settings
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", bind));

    let mut card = wayfarer_weather::agent_card(url);
    card.name = settings.name.clone();

    let router = A2aServer::new(card, Arc::new(WeatherAgent))
        .with_auth_token(non_empty(&settings.auth_token))
        .router_with(wayfarer_weather::http::router());

    let handle = serve(router, &bind).await?;
    info!("Weather agent '{}' serving at {}", settings.name, handle.url());
    handle.shutdown_on(shutdown_signal()).await
}

async fn run_planner(config: &WayfarerConfig, bind: Option<String>) -> Result<()> {
    let settings = &config.planner;
    let bind = bind.unwrap_or_else(|| settings.bind.clone());
    let url = settings
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", bind));

    let planner = build_planner(config)?;
    let router = A2aServer::new(
        wayfarer_planner::agent_card(url),
        Arc::new(PlannerAgent::new(planner.clone())),
    )
    .with_auth_token(non_empty(&settings.auth_token))
    .router_with(wayfarer_planner::http::router(planner));

    let handle = serve(router, &bind).await?;
    info!(
        "Travel planner serving at {} (weather agent: {})",
        handle.url(),
        settings.weather_agent_url
    );
    handle.shutdown_on(shutdown_signal()).await
}

fn build_planner(config: &WayfarerConfig) -> Result<Arc<TravelPlanner>> {
    let settings = &config.planner;

    let client = A2aClient::new(Duration::from_secs(settings.timeout_secs))?;
    let peer = AgentEndpoint {
        name: wayfarer_weather::agent::AGENT_NAME.to_string(),
        url: settings.weather_agent_url.clone(),
        token: non_empty(&settings.weather_agent_token),
    };
    let tool = remote_weather_tool(client, peer).with_wait_policy(WaitPolicy {
        poll_interval: Duration::from_millis(settings.poll_interval_ms),
        timeout: Duration::from_secs(settings.timeout_secs),
    });

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(tool));

    let decider: Arc<dyn DecidesToolUse> = match settings.decider {
        DeciderKind::Keyword => Arc::new(KeywordDecider),
        DeciderKind::Llm => {
            let api_key = config
                .llm
                .resolved_api_key()
                .context("No API key for the llm decider")?;
            let provider = match config.llm.provider {
                ProviderKind::Google => GoogleProvider::new(
                    api_key,
                    config.llm.model.clone(),
                    config.llm.base_url.clone(),
                )?,
            };
            Arc::new(LlmDecider::new(Arc::new(provider)))
        }
    };
    debug!("Planner using {} decider", decider.name());

    Ok(Arc::new(TravelPlanner::new(decider, Arc::new(registry))))
}
