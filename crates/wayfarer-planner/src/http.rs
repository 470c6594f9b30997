//! `POST /plan` and `POST /travel_advice`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::PlannerError;
use crate::planner::{TravelAdvice, TravelAnswer, TravelPlanner};

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub destination: String,
}

pub fn router(planner: Arc<TravelPlanner>) -> Router {
    Router::new()
        .route("/plan", post(plan))
        .route("/travel_advice", post(travel_advice))
        .with_state(planner)
}

async fn plan(
    State(planner): State<Arc<TravelPlanner>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<TravelAnswer>, PlannerError> {
    info!("Plan request: {}", request.query.chars().take(100).collect::<String>());
    Ok(Json(planner.plan_trip(&request.query).await?))
}

async fn travel_advice(
    State(planner): State<Arc<TravelPlanner>>,
    Json(request): Json<AdviceRequest>,
) -> Result<Json<TravelAdvice>, PlannerError> {
    info!("Travel advice request for {}", request.destination);
    Ok(Json(planner.advise(&request.destination).await?))
}
