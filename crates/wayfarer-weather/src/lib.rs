//! wayfarer-weather: the weather agent
//!
//! A pure lookup over a fixed table of cities, exposed as a tool, as an A2A
//! task handler, and as a plain `GET /weather/{city}` route.

pub mod agent;
pub mod http;
pub mod lookup;
pub mod tool;

pub use agent::{WeatherAgent, agent_card};
pub use lookup::{KNOWN_LOCATIONS, WeatherQuery, WeatherResult, get_weather};
pub use tool::{GetWeatherTool, remote_weather_tool};
