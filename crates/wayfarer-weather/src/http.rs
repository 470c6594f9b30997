//! Plain HTTP lookup route, alongside the A2A surface

use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};

use crate::lookup::{WeatherQuery, WeatherResult, get_weather};

/// `GET /weather/{city}`; unknown cities answer `200` with `found: false`
pub fn router() -> Router {
    Router::new().route("/weather/{city}", get(weather_for_city))
}

async fn weather_for_city(Path(city): Path<String>) -> Json<WeatherResult> {
    Json(get_weather(&WeatherQuery::new(city)))
}
