use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::actor::CurrentActor;
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers))
        .route("/drivers/available", get(available_drivers))
        .route("/drivers/:id/online", patch(set_online))
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub car_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOnlineRequest {
    pub is_online: bool,
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(state.engine.directory().drivers().await?))
}

async fn available_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let drivers = state
        .engine
        .directory()
        .available_drivers(&query.car_type)
        .await?;
    Ok(Json(drivers))
}

async fn set_online(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<SetOnlineRequest>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .engine
        .set_driver_online(&actor, &id, payload.is_online)
        .await?;
    Ok(Json(driver))
}
