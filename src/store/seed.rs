use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::agent::Agent;
use crate::models::car_type::CarType;
use crate::models::customer::Customer;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::store::memory::MemoryBackend;

/// Reference data and parties loaded into the in-memory backend at startup.
/// Every collection is optional; bookings are never seeded.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub car_types: Vec<CarType>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl Seed {
    pub async fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            AppError::Internal(format!("failed to read seed file {}: {err}", path.display()))
        })?;
        Self::parse(&raw)
            .map_err(|err| AppError::Internal(format!("invalid seed file {}: {err}", path.display())))
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn apply(&self, backend: &MemoryBackend) {
        self.car_types.iter().for_each(|car_type| backend.put_car_type(car_type));
        self.routes.iter().for_each(|route| backend.put_route(route));
        self.drivers.iter().for_each(|driver| backend.put_driver(driver));
        self.agents.iter().for_each(|agent| backend.put_agent(agent));
        self.customers.iter().for_each(|customer| backend.put_customer(customer));

        info!(
            car_types = self.car_types.len(),
            routes = self.routes.len(),
            drivers = self.drivers.len(),
            agents = self.agents.len(),
            customers = self.customers.len(),
            "seed data loaded"
        );
    }
}
