use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::time::{sleep, Duration};

use crate::models::agent::Agent;
use crate::models::car_type::CarType;
use crate::models::customer::Customer;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::store::backend::{Backend, BackendError, BackendResult};
use crate::store::rows::{AgentRow, BookingRow, CarTypeRow, CustomerRow, DriverRow, RouteRow};

pub const CAR_TYPES: &str = "car_types";
pub const ROUTES: &str = "routes";
pub const CUSTOMERS: &str = "customers";
pub const DRIVERS: &str = "drivers";
pub const AGENTS: &str = "agents";
pub const BOOKINGS: &str = "bookings";

/// In-process backend. Tables can be made to fail, and writes delayed, to
/// exercise the engine's persistence error paths.
#[derive(Default)]
pub struct MemoryBackend {
    car_types: DashMap<String, CarTypeRow>,
    routes: DashMap<String, RouteRow>,
    customers: DashMap<String, CustomerRow>,
    customer_phones: DashMap<String, String>,
    drivers: DashMap<String, DriverRow>,
    agents: DashMap<String, AgentRow>,
    bookings: DashMap<String, BookingRow>,
    failing_tables: DashSet<&'static str>,
    write_delay_ms: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_car_type(&self, car_type: &CarType) {
        self.car_types
            .insert(car_type.id.clone(), CarTypeRow::from(car_type));
    }

    pub fn put_route(&self, route: &Route) {
        self.routes.insert(route.id.clone(), RouteRow::from(route));
    }

    pub fn put_customer(&self, customer: &Customer) {
        self.customer_phones
            .insert(customer.phone.clone(), customer.id.clone());
        self.customers
            .insert(customer.id.clone(), CustomerRow::from(customer));
    }

    pub fn put_driver(&self, driver: &Driver) {
        self.drivers.insert(driver.id.clone(), DriverRow::from(driver));
    }

    pub fn put_agent(&self, agent: &Agent) {
        self.agents.insert(agent.id.clone(), AgentRow::from(agent));
    }

    pub fn remove_driver(&self, id: &str) {
        self.drivers.remove(id);
    }

    pub fn remove_agent(&self, id: &str) {
        self.agents.remove(id);
    }

    pub fn remove_customer(&self, id: &str) {
        if let Some((_, row)) = self.customers.remove(id) {
            self.customer_phones.remove(&row.phone);
        }
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    /// Every call touching `table` fails with [`BackendError::Unavailable`]
    /// until [`MemoryBackend::restore_table`] is called.
    pub fn fail_table(&self, table: &'static str) {
        self.failing_tables.insert(table);
    }

    pub fn restore_table(&self, table: &'static str) {
        self.failing_tables.remove(table);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check(&self, table: &'static str) -> BackendResult<()> {
        if self.failing_tables.contains(table) {
            return Err(BackendError::Unavailable(format!("{table} is unavailable")));
        }
        Ok(())
    }

    async fn before_write(&self, table: &'static str) -> BackendResult<()> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            sleep(Duration::from_millis(delay)).await;
        }
        self.check(table)
    }
}

fn pick<T: Clone>(table: &DashMap<String, T>, ids: &[String]) -> Vec<T> {
    ids.iter()
        .filter_map(|id| table.get(id).map(|entry| entry.value().clone()))
        .collect()
}

fn all<T: Clone>(table: &DashMap<String, T>) -> Vec<T> {
    table.iter().map(|entry| entry.value().clone()).collect()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_car_types(&self) -> BackendResult<Vec<CarTypeRow>> {
        self.check(CAR_TYPES)?;
        Ok(all(&self.car_types))
    }

    async fn get_car_type(&self, id: &str) -> BackendResult<Option<CarTypeRow>> {
        self.check(CAR_TYPES)?;
        Ok(self.car_types.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_routes(&self) -> BackendResult<Vec<RouteRow>> {
        self.check(ROUTES)?;
        Ok(all(&self.routes))
    }

    async fn get_route(&self, id: &str) -> BackendResult<Option<RouteRow>> {
        self.check(ROUTES)?;
        Ok(self.routes.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_routes(&self, ids: &[String]) -> BackendResult<Vec<RouteRow>> {
        self.check(ROUTES)?;
        Ok(pick(&self.routes, ids))
    }

    async fn get_customers(&self, ids: &[String]) -> BackendResult<Vec<CustomerRow>> {
        self.check(CUSTOMERS)?;
        Ok(pick(&self.customers, ids))
    }

    async fn find_customer_by_phone(&self, phone: &str) -> BackendResult<Option<CustomerRow>> {
        self.check(CUSTOMERS)?;
        let Some(id) = self.customer_phones.get(phone).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        Ok(self.customers.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert_customer(&self, row: CustomerRow) -> BackendResult<CustomerRow> {
        self.before_write(CUSTOMERS).await?;
        match self.customer_phones.entry(row.phone.clone()) {
            Entry::Occupied(_) => Err(BackendError::Duplicate {
                table: CUSTOMERS,
                key: row.phone,
            }),
            Entry::Vacant(slot) => {
                // Row first, so a phone hit always resolves to a customer.
                self.customers.insert(row.id.clone(), row.clone());
                slot.insert(row.id.clone());
                Ok(row)
            }
        }
    }

    async fn list_drivers(&self) -> BackendResult<Vec<DriverRow>> {
        self.check(DRIVERS)?;
        Ok(all(&self.drivers))
    }

    async fn get_driver(&self, id: &str) -> BackendResult<Option<DriverRow>> {
        self.check(DRIVERS)?;
        Ok(self.drivers.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_drivers(&self, ids: &[String]) -> BackendResult<Vec<DriverRow>> {
        self.check(DRIVERS)?;
        Ok(pick(&self.drivers, ids))
    }

    async fn set_driver_online(&self, id: &str, is_online: bool) -> BackendResult<DriverRow> {
        self.before_write(DRIVERS).await?;
        let mut driver = self.drivers.get_mut(id).ok_or_else(|| BackendError::NotFound {
            table: DRIVERS,
            id: id.to_string(),
        })?;
        driver.is_online = is_online;
        Ok(driver.clone())
    }

    async fn list_agents(&self) -> BackendResult<Vec<AgentRow>> {
        self.check(AGENTS)?;
        Ok(all(&self.agents))
    }

    async fn get_agent(&self, id: &str) -> BackendResult<Option<AgentRow>> {
        self.check(AGENTS)?;
        Ok(self.agents.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_agents(&self, ids: &[String]) -> BackendResult<Vec<AgentRow>> {
        self.check(AGENTS)?;
        Ok(pick(&self.agents, ids))
    }

    async fn find_agent_by_email(&self, email: &str) -> BackendResult<Option<AgentRow>> {
        self.check(AGENTS)?;
        Ok(self
            .agents
            .iter()
            .find(|entry| entry.value().email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone()))
    }

    async fn increment_agent_bookings(&self, id: &str) -> BackendResult<u64> {
        self.before_write(AGENTS).await?;
        // The shard write lock is held for the whole read-increment-write.
        let mut agent = self.agents.get_mut(id).ok_or_else(|| BackendError::NotFound {
            table: AGENTS,
            id: id.to_string(),
        })?;
        agent.bookings_created = agent.bookings_created.saturating_add(1);
        Ok(agent.bookings_created)
    }

    async fn list_bookings(&self) -> BackendResult<Vec<BookingRow>> {
        self.check(BOOKINGS)?;
        Ok(all(&self.bookings))
    }

    async fn get_booking(&self, id: &str) -> BackendResult<Option<BookingRow>> {
        self.check(BOOKINGS)?;
        Ok(self.bookings.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_booking(&self, row: BookingRow) -> BackendResult<BookingRow> {
        self.before_write(BOOKINGS).await?;
        match self.bookings.entry(row.id.clone()) {
            Entry::Occupied(_) => Err(BackendError::Duplicate {
                table: BOOKINGS,
                key: row.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
                Ok(row)
            }
        }
    }

    async fn replace_booking(&self, row: BookingRow) -> BackendResult<BookingRow> {
        self.before_write(BOOKINGS).await?;
        let mut stored = self
            .bookings
            .get_mut(&row.id)
            .ok_or_else(|| BackendError::NotFound {
                table: BOOKINGS,
                id: row.id.clone(),
            })?;
        *stored = row.clone();
        Ok(row)
    }

    async fn delete_booking(&self, id: &str) -> BackendResult<()> {
        self.before_write(BOOKINGS).await?;
        self.bookings
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound {
                table: BOOKINGS,
                id: id.to_string(),
            })
    }
}
