use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::rest::caller::Caller;
use crate::error::AppError;
use crate::location::LocationService;
use crate::models::coordinate::Coordinate;
use crate::models::stop::{Cargo, DeliveryStop, StopStatus};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create_delivery).get(list_deliveries))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/accept", post(accept_delivery))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub pickup_address: Option<String>,
    pub pickup_coordinate: Option<Coordinate>,
    pub details: String,
    pub cargo: Cargo,
}

#[derive(Deserialize)]
pub struct ListDeliveriesQuery {
    pub status: Option<StopStatus>,
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<DeliveryStop>, AppError> {
    let company = caller.require(Role::Company)?;

    if payload.details.trim().is_empty() {
        return Err(AppError::BadRequest("details cannot be empty".to_string()));
    }
    if !payload.cargo.is_valid() {
        return Err(AppError::BadRequest(
            "cargo weight and dimensions must be > 0".to_string(),
        ));
    }

    let address = payload
        .pickup_address
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty());

    let (coordinate, address) =
        resolve_pickup(state.location.as_ref(), payload.pickup_coordinate, address).await?;

    let stop = DeliveryStop::new(coordinate, address, payload.details, payload.cargo);
    state.store.put_delivery(stop.clone());
    state.metrics.deliveries_created_total.inc();

    info!(
        delivery_id = %stop.id,
        company_id = %company.id,
        country = stop.country_of_pickup.as_deref().unwrap_or("-"),
        "delivery created"
    );

    Ok(Json(stop))
}

/// Fills in whichever of coordinate and address the client left out.
async fn resolve_pickup(
    location: &dyn LocationService,
    coordinate: Option<Coordinate>,
    address: Option<String>,
) -> Result<(Coordinate, String), AppError> {
    if let Some(coordinate) = coordinate {
        if !coordinate.is_valid() {
            return Err(AppError::BadRequest(
                "pickup_coordinate is out of range".to_string(),
            ));
        }
    }

    match (coordinate, address) {
        (Some(coordinate), Some(address)) => Ok((coordinate, address)),
        (Some(coordinate), None) => {
            let found = location.reverse_geocode(coordinate).await.map_err(|err| {
                warn!(error = %err, "reverse geocoding failed");
                AppError::Unresolvable(err.to_string())
            })?;
            let address = found.ok_or_else(|| {
                AppError::Unresolvable(format!(
                    "no address found for {}, {}",
                    coordinate.latitude, coordinate.longitude
                ))
            })?;
            Ok((coordinate, address))
        }
        (None, Some(address)) => {
            let found = location.geocode_address(&address).await.map_err(|err| {
                warn!(error = %err, "geocoding failed");
                AppError::Unresolvable(err.to_string())
            })?;
            let coordinate = found.ok_or_else(|| {
                AppError::Unresolvable(format!("no coordinate found for {address:?}"))
            })?;
            Ok((coordinate, address))
        }
        (None, None) => Err(AppError::BadRequest(
            "pickup_address or pickup_coordinate is required".to_string(),
        )),
    }
}

async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDeliveriesQuery>,
) -> Json<Vec<DeliveryStop>> {
    let deliveries = state
        .store
        .deliveries()
        .into_iter()
        .filter(|stop| query.status.is_none_or(|status| stop.status == status))
        .collect();

    Json(deliveries)
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeliveryStop>, AppError> {
    state
        .store
        .delivery(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))
}

async fn accept_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    caller: Caller,
) -> Result<Json<DeliveryStop>, AppError> {
    let trucker = caller.require(Role::Trucker)?;
    let stop = state
        .store
        .accept_stop(&id, trucker.current_route_id, state.price_per_stop)?;

    info!(
        delivery_id = %id,
        trucker_id = %trucker.id,
        route_id = ?stop.route_id,
        "delivery accepted"
    );

    Ok(Json(stop))
}
