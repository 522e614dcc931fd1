use async_trait::async_trait;
use thiserror::Error;

use crate::error::AppError;
use crate::store::rows::{AgentRow, BookingRow, CarTypeRow, CustomerRow, DriverRow, RouteRow};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("duplicate {table} key: {key}")]
    Duplicate { table: &'static str, key: String },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Table-level access to the persistence backend. Rows cross this boundary in
/// their flat stored shape; enrichment happens above it.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_car_types(&self) -> BackendResult<Vec<CarTypeRow>>;
    async fn get_car_type(&self, id: &str) -> BackendResult<Option<CarTypeRow>>;

    async fn list_routes(&self) -> BackendResult<Vec<RouteRow>>;
    async fn get_route(&self, id: &str) -> BackendResult<Option<RouteRow>>;
    async fn get_routes(&self, ids: &[String]) -> BackendResult<Vec<RouteRow>>;

    async fn get_customers(&self, ids: &[String]) -> BackendResult<Vec<CustomerRow>>;
    async fn find_customer_by_phone(&self, phone: &str) -> BackendResult<Option<CustomerRow>>;
    /// Fails with [`BackendError::Duplicate`] when the phone is already taken.
    async fn insert_customer(&self, row: CustomerRow) -> BackendResult<CustomerRow>;

    async fn list_drivers(&self) -> BackendResult<Vec<DriverRow>>;
    async fn get_driver(&self, id: &str) -> BackendResult<Option<DriverRow>>;
    async fn get_drivers(&self, ids: &[String]) -> BackendResult<Vec<DriverRow>>;
    async fn set_driver_online(&self, id: &str, is_online: bool) -> BackendResult<DriverRow>;

    async fn list_agents(&self) -> BackendResult<Vec<AgentRow>>;
    async fn get_agent(&self, id: &str) -> BackendResult<Option<AgentRow>>;
    async fn get_agents(&self, ids: &[String]) -> BackendResult<Vec<AgentRow>>;
    async fn find_agent_by_email(&self, email: &str) -> BackendResult<Option<AgentRow>>;
    /// Atomically adds one to `bookings_created` and returns the new count.
    async fn increment_agent_bookings(&self, id: &str) -> BackendResult<u64>;

    async fn list_bookings(&self) -> BackendResult<Vec<BookingRow>>;
    async fn get_booking(&self, id: &str) -> BackendResult<Option<BookingRow>>;
    async fn insert_booking(&self, row: BookingRow) -> BackendResult<BookingRow>;
    async fn replace_booking(&self, row: BookingRow) -> BackendResult<BookingRow>;
    async fn delete_booking(&self, id: &str) -> BackendResult<()>;
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound { table, id } => {
                AppError::NotFound(format!("{table} row {id} not found"))
            }
            BackendError::Duplicate { table, key } => {
                AppError::Conflict(format!("duplicate {table} key: {key}"))
            }
            BackendError::Unavailable(msg) => AppError::Persistence(msg),
        }
    }
}
