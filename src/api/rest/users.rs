use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::caller::Caller;
use crate::error::AppError;
use crate::models::preferences::{parse_country_list, DriverPreferences};
use crate::models::user::{Role, UserProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/:id", get(get_user))
        .route("/users/:id/preferences", put(update_preferences))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub role: Role,
}

/// Either `["Germany", "France"]` or `"Germany, France"`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CountriesInput {
    List(Vec<String>),
    Text(String),
}

impl CountriesInput {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            CountriesInput::List(list) => parse_country_list(&list.join(",")),
            CountriesInput::Text(text) => parse_country_list(&text),
        }
    }
}

#[derive(Deserialize)]
pub struct PreferencesRequest {
    pub preferred_countries: Option<CountriesInput>,
    pub truck_type: String,
    pub fuel_economy_km_per_l: f64,
    pub cargo_space_m3: f64,
    pub driving_hours_per_day: u8,
    pub sleep_duration_hours: u8,
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Json<UserProfile> {
    let user = UserProfile::new(payload.role);
    state.store.put_user(user.clone());

    info!(user_id = %user.id, role = ?user.role, "user registered");
    Json(user)
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .store
        .user(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    caller: Caller,
    Json(payload): Json<PreferencesRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let trucker = caller.require(Role::Trucker)?;
    if trucker.id != id {
        return Err(AppError::Forbidden(
            "preferences can only be changed by their owner".to_string(),
        ));
    }

    let preferences = DriverPreferences {
        preferred_countries: payload
            .preferred_countries
            .map(CountriesInput::into_set)
            .unwrap_or_default(),
        truck_type: payload.truck_type.trim().to_string(),
        fuel_economy_km_per_l: payload.fuel_economy_km_per_l,
        cargo_space_m3: payload.cargo_space_m3,
        driving_hours_per_day: payload.driving_hours_per_day,
        sleep_duration_hours: payload.sleep_duration_hours,
    };
    preferences.validate().map_err(AppError::BadRequest)?;

    let countries = preferences.preferred_countries.len();
    let user = state
        .store
        .update_user(&id, |user| user.preferences = Some(preferences))?;

    info!(user_id = %id, countries, "driver preferences saved");
    Ok(Json(user))
}
