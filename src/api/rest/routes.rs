use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::caller::Caller;
use crate::engine::build_route;
use crate::error::AppError;
use crate::models::coordinate::Coordinate;
use crate::models::route::Route;
use crate::models::user::{Role, UserProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", post(commit_route).get(list_routes))
        .route("/routes/plan", post(plan_route))
        .route("/routes/:id", get(get_route))
}

#[derive(Deserialize)]
pub struct PlanRouteRequest {
    pub start: Coordinate,
    pub title: Option<String>,
}

/// Runs the sequencer over the latest pending stops for `trucker`.
fn plan(
    state: &AppState,
    trucker: &UserProfile,
    request: PlanRouteRequest,
    outcome: &str,
) -> Result<Route, AppError> {
    let preferences = trucker.preferences.as_ref().ok_or_else(|| {
        AppError::BadRequest("set driver preferences before planning a route".to_string())
    })?;
    if !request.start.is_valid() {
        return Err(AppError::BadRequest(
            "start is not a valid coordinate".to_string(),
        ));
    }

    let started = Instant::now();
    let candidates = state.store.pending_deliveries();
    let mut route = build_route(
        request.start,
        &candidates,
        preferences,
        state.price_per_stop,
    );
    if let Some(title) = request
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
    {
        route.title = title;
    }

    let outcome = if route.is_empty() { "empty" } else { outcome };
    state.metrics.record_route(
        outcome,
        route.ordered_stops.len(),
        started.elapsed().as_secs_f64(),
    );

    info!(
        trucker_id = %trucker.id,
        candidates = candidates.len(),
        stops = route.ordered_stops.len(),
        total_distance_km = route.total_distance_km,
        estimated_earnings = route.estimated_earnings,
        outcome,
        "route planned"
    );

    Ok(route)
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<PlanRouteRequest>,
) -> Result<Json<Route>, AppError> {
    let trucker = caller.require(Role::Trucker)?;
    plan(&state, &trucker, payload, "planned").map(Json)
}

async fn commit_route(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<PlanRouteRequest>,
) -> Result<Json<Route>, AppError> {
    let trucker = caller.require(Role::Trucker)?;
    let route = plan(&state, &trucker, payload, "committed")?;

    if route.is_empty() {
        return Ok(Json(route));
    }

    let route = state.store.commit_route(&trucker.id, route)?;
    info!(trucker_id = %trucker.id, route_id = %route.id, "route committed");

    Ok(Json(route))
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Json<Vec<Route>> {
    Json(state.store.routes())
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, AppError> {
    state
        .store
        .route(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))
}
