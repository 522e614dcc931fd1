use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::error::AppError;
use crate::models::agent::Agent;
use crate::models::car_type::CarType;
use crate::models::route::Route;
use crate::state::AppState;
use crate::store::snapshot::{load_snapshot, Snapshot};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/car-types", get(list_car_types))
        .route("/routes", get(list_routes))
        .route("/agents", get(list_agents))
        .route("/snapshot", get(snapshot))
}

async fn list_car_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CarType>>, AppError> {
    Ok(Json(state.engine.directory().car_types().await?))
}

async fn list_routes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Route>>, AppError> {
    Ok(Json(state.engine.directory().routes().await?))
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Agent>>, AppError> {
    Ok(Json(state.engine.directory().agents().await?))
}

/// Full resync payload; partial failures are reported in `warnings`.
async fn snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(load_snapshot(state.engine.directory(), state.engine.store()).await)
}
