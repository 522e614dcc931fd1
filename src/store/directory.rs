use std::sync::Arc;

use tokio::time::Duration;

use crate::error::AppError;
use crate::models::agent::Agent;
use crate::models::car_type::CarType;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::store::backend::Backend;
use crate::store::guarded;

/// Read access to reference data (car types, routes) and the party registry
/// (drivers, agents).
#[derive(Clone)]
pub struct Directory {
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl Directory {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn car_types(&self) -> Result<Vec<CarType>, AppError> {
        let mut car_types: Vec<CarType> =
            guarded(self.timeout, "list car types", self.backend.list_car_types())
                .await?
                .into_iter()
                .map(CarType::from)
                .collect();
        car_types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(car_types)
    }

    pub async fn car_type(&self, id: &str) -> Result<CarType, AppError> {
        guarded(self.timeout, "get car type", self.backend.get_car_type(id))
            .await?
            .map(CarType::from)
            .ok_or_else(|| AppError::NotFound(format!("car type {id} not found")))
    }

    pub async fn routes(&self) -> Result<Vec<Route>, AppError> {
        let mut routes: Vec<Route> = guarded(self.timeout, "list routes", self.backend.list_routes())
            .await?
            .into_iter()
            .map(Route::from)
            .collect();
        routes.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.id.cmp(&b.id)));
        Ok(routes)
    }

    pub async fn route(&self, id: &str) -> Result<Route, AppError> {
        guarded(self.timeout, "get route", self.backend.get_route(id))
            .await?
            .map(Route::from)
            .ok_or_else(|| AppError::NotFound(format!("route {id} not found")))
    }

    pub async fn drivers(&self) -> Result<Vec<Driver>, AppError> {
        let mut drivers: Vec<Driver> =
            guarded(self.timeout, "list drivers", self.backend.list_drivers())
                .await?
                .into_iter()
                .map(Driver::from)
                .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    pub async fn driver(&self, id: &str) -> Result<Driver, AppError> {
        guarded(self.timeout, "get driver", self.backend.get_driver(id))
            .await?
            .map(Driver::from)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))
    }

    /// Online drivers whose vehicle is of `car_type`.
    pub async fn available_drivers(&self, car_type: &str) -> Result<Vec<Driver>, AppError> {
        Ok(self
            .drivers()
            .await?
            .into_iter()
            .filter(|driver| driver.is_online && driver.car_type == car_type)
            .collect())
    }

    pub async fn agents(&self) -> Result<Vec<Agent>, AppError> {
        let mut agents: Vec<Agent> = guarded(self.timeout, "list agents", self.backend.list_agents())
            .await?
            .into_iter()
            .map(Agent::from)
            .collect();
        agents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(agents)
    }
}
