use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::actor::CurrentActor;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingPatch, BookingStatus, NewBooking};
use crate::store::booking_store::BookingFilter;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route(
            "/bookings/:id",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
        .route("/bookings/:id/status", patch(update_status))
        .route("/bookings/:id/assign", post(assign_driver))
        .route("/bookings/:id/release", post(release_driver))
        .route("/bookings/:id/commission/paid", post(mark_commission_paid))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    #[serde(default)]
    pub driver_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriverRequest {
    pub driver_id: String,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.engine.create_booking(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.engine.store().list(&filter).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.store().get(&id).await?;
    Ok(Json(booking))
}

async fn update_booking(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<BookingPatch>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.update_booking(&actor, &id, payload).await?;
    Ok(Json(booking))
}

async fn delete_booking(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.engine.delete_booking(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .engine
        .update_booking_status(&actor, &id, payload.status, payload.driver_id)
        .await?;
    Ok(Json(booking))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(payload): Json<AssignDriverRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .engine
        .assign_booking_to_driver(&actor, &id, &payload.driver_id)
        .await?;
    Ok(Json(booking))
}

async fn release_driver(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.release_booking_from_driver(&actor, &id).await?;
    Ok(Json(booking))
}

async fn mark_commission_paid(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.mark_commission_as_paid(&actor, &id).await?;
    Ok(Json(booking))
}
