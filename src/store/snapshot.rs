use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::agent::Agent;
use crate::models::booking::Booking;
use crate::models::car_type::CarType;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::store::booking_store::{BookingFilter, BookingStore};
use crate::store::directory::Directory;

/// Everything a role view needs on (re)connect. A collection that failed to
/// load is empty and named in `warnings`; the rest are still usable.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub car_types: Vec<CarType>,
    pub routes: Vec<Route>,
    pub bookings: Vec<Booking>,
    pub drivers: Vec<Driver>,
    pub agents: Vec<Agent>,
    pub warnings: Vec<String>,
}

impl Snapshot {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub async fn load_snapshot(directory: &Directory, bookings: &BookingStore) -> Snapshot {
    let filter = BookingFilter::default();
    let (car_types, routes, booking_list, drivers, agents) = tokio::join!(
        directory.car_types(),
        directory.routes(),
        bookings.list(&filter),
        directory.drivers(),
        directory.agents(),
    );

    let mut warnings = Vec::new();
    let snapshot = Snapshot {
        car_types: settle("car types", car_types, &mut warnings),
        routes: settle("routes", routes, &mut warnings),
        bookings: settle("bookings", booking_list, &mut warnings),
        drivers: settle("drivers", drivers, &mut warnings),
        agents: settle("agents", agents, &mut warnings),
        warnings,
    };

    info!(
        bookings = snapshot.bookings.len(),
        drivers = snapshot.drivers.len(),
        failed = snapshot.warnings.len(),
        "snapshot loaded"
    );
    snapshot
}

fn settle<T>(collection: &str, result: Result<Vec<T>, AppError>, warnings: &mut Vec<String>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            warn!(collection, error = %err, "failed to load collection");
            warnings.push(format!("failed to load {collection}"));
            Vec::new()
        }
    }
}
