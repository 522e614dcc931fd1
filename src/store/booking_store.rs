use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use tokio::time::Duration;
use tracing::warn;

use crate::error::AppError;
use crate::models::agent::Agent;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::customer::Customer;
use crate::models::driver::Driver;
use crate::models::route::Route;
use crate::store::backend::Backend;
use crate::store::guarded;
use crate::store::rows::{BookingRow, Relations};

/// Per-role booking queries: a driver's jobs, an agent's bookings, the
/// pending pool for one car type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub driver_id: Option<String>,
    pub agent_id: Option<String>,
    pub car_type: Option<String>,
}

impl BookingFilter {
    pub fn by_car_type(car_type: impl Into<String>) -> Self {
        Self {
            car_type: Some(car_type.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, row: &BookingRow) -> bool {
        self.status.is_none_or(|status| row.status == status)
            && self
                .driver_id
                .as_ref()
                .is_none_or(|id| row.driver_id.as_ref() == Some(id))
            && self
                .agent_id
                .as_ref()
                .is_none_or(|id| row.agent_id.as_ref() == Some(id))
            && self.car_type.as_ref().is_none_or(|car| &row.car_type == car)
    }
}

/// Related records fetched in one batch for a set of booking rows. `None`
/// marks an optional relation whose batch could not be loaded.
struct Lookup {
    customers: HashMap<String, Customer>,
    routes: HashMap<String, Route>,
    drivers: Option<HashMap<String, Driver>>,
    agents: Option<HashMap<String, Agent>>,
}

/// Booking persistence with enrichment. Every read goes through
/// [`BookingStore::enrich_all`], so the relation rules live in one place.
#[derive(Clone)]
pub struct BookingStore {
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl BookingStore {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn get(&self, id: &str) -> Result<Booking, AppError> {
        let row = self.get_row(id).await?;
        self.enrich(row).await
    }

    pub async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut rows: Vec<BookingRow> =
            guarded(self.timeout, "list bookings", self.backend.list_bookings())
                .await?
                .into_iter()
                .filter(|row| filter.matches(row))
                .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.enrich_all(rows).await
    }

    /// Stores a new row. The committed row is returned unenriched so the
    /// caller can publish before any relation lookup runs.
    pub async fn insert(&self, row: BookingRow) -> Result<BookingRow, AppError> {
        guarded(self.timeout, "insert booking", self.backend.insert_booking(row)).await
    }

    pub async fn replace(&self, row: BookingRow) -> Result<BookingRow, AppError> {
        guarded(
            self.timeout,
            "replace booking",
            self.backend.replace_booking(row),
        )
        .await
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        guarded(self.timeout, "delete booking", self.backend.delete_booking(id))
            .await
            .map_err(|err| match err {
                AppError::NotFound(_) => booking_not_found(id),
                other => other,
            })
    }

    /// The stored row, for the engine's read-validate-write cycle.
    pub(crate) async fn get_row(&self, id: &str) -> Result<BookingRow, AppError> {
        guarded(self.timeout, "get booking", self.backend.get_booking(id))
            .await?
            .ok_or_else(|| booking_not_found(id))
    }

    pub async fn enrich(&self, row: BookingRow) -> Result<Booking, AppError> {
        let mut enriched = self.enrich_all(vec![row]).await?;
        enriched
            .pop()
            .ok_or_else(|| AppError::Internal("enrichment returned no booking".to_string()))
    }

    /// Resolves the relations of every row with one lookup per table.
    pub async fn enrich_all(&self, rows: Vec<BookingRow>) -> Result<Vec<Booking>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let customer_ids = distinct(rows.iter().map(|row| Some(&row.customer_id)));
        let route_ids = distinct(rows.iter().map(|row| Some(&row.route_id)));
        let driver_ids = distinct(rows.iter().map(|row| row.driver_id.as_ref()));
        let agent_ids = distinct(rows.iter().map(|row| row.agent_id.as_ref()));

        let (customers, routes, drivers, agents) = tokio::join!(
            guarded(
                self.timeout,
                "load customers",
                self.backend.get_customers(&customer_ids)
            ),
            guarded(self.timeout, "load routes", self.backend.get_routes(&route_ids)),
            async {
                if driver_ids.is_empty() {
                    return Ok(Vec::new());
                }
                guarded(self.timeout, "load drivers", self.backend.get_drivers(&driver_ids)).await
            },
            async {
                if agent_ids.is_empty() {
                    return Ok(Vec::new());
                }
                guarded(self.timeout, "load agents", self.backend.get_agents(&agent_ids)).await
            },
        );

        let lookup = Lookup {
            customers: customers?
                .into_iter()
                .map(|row| (row.id.clone(), Customer::from(row)))
                .collect(),
            routes: routes?
                .into_iter()
                .map(|row| (row.id.clone(), Route::from(row)))
                .collect(),
            drivers: optional_relation("drivers", drivers).map(|rows| {
                rows.into_iter()
                    .map(|row| (row.id.clone(), Driver::from(row)))
                    .collect()
            }),
            agents: optional_relation("agents", agents).map(|rows| {
                rows.into_iter()
                    .map(|row| (row.id.clone(), Agent::from(row)))
                    .collect()
            }),
        };

        rows.into_iter().map(|row| join(row, &lookup)).collect()
    }
}

/// Customer and route are mandatory; a dangling or unloadable driver or
/// agent reference degrades to `None`.
fn join(row: BookingRow, lookup: &Lookup) -> Result<Booking, AppError> {
    let customer = lookup.customers.get(&row.customer_id).cloned().ok_or_else(|| {
        AppError::DataIntegrity(format!(
            "booking {} references missing customer {}",
            row.id, row.customer_id
        ))
    })?;
    let route = lookup.routes.get(&row.route_id).cloned().ok_or_else(|| {
        AppError::DataIntegrity(format!(
            "booking {} references missing route {}",
            row.id, row.route_id
        ))
    })?;

    let driver = row.driver_id.as_ref().and_then(|id| {
        let drivers = lookup.drivers.as_ref()?;
        let driver = drivers.get(id).cloned();
        if driver.is_none() {
            warn!(booking_id = %row.id, driver_id = %id, "booking references unknown driver");
        }
        driver
    });
    let agent = row.agent_id.as_ref().and_then(|id| {
        let agents = lookup.agents.as_ref()?;
        let agent = agents.get(id).cloned();
        if agent.is_none() {
            warn!(booking_id = %row.id, agent_id = %id, "booking references unknown agent");
        }
        agent
    });

    Ok(row.into_booking(Relations {
        customer,
        route,
        driver,
        agent,
    }))
}

/// Drivers and agents are optional on a booking, so a failed batch leaves
/// those relations empty instead of failing the read.
fn optional_relation<T>(relation: &str, result: Result<Vec<T>, AppError>) -> Option<Vec<T>> {
    match result {
        Ok(rows) => Some(rows),
        Err(err) => {
            warn!(relation, error = %err, "relation lookup failed; leaving it unresolved");
            None
        }
    }
}

fn distinct<'a>(ids: impl Iterator<Item = Option<&'a String>>) -> Vec<String> {
    ids.flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn booking_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("booking {id} not found"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration as ChronoDuration, Utc};

    use super::*;
    use crate::store::memory::{MemoryBackend, AGENTS, DRIVERS, ROUTES};

    fn seeded() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend.put_route(&Route {
            id: "airport-downtown".to_string(),
            from: "International Airport".to_string(),
            to: "Downtown Business District".to_string(),
            distance: "25 km".to_string(),
            duration: "35 min".to_string(),
            pricing: BTreeMap::from([("camry".to_string(), 45.0)]),
        });
        backend.put_customer(&Customer {
            id: "c-1".to_string(),
            name: "Layla".to_string(),
            phone: "+966501234567".to_string(),
            email: None,
        });
        backend
    }

    fn row(id: &str, minutes_ago: i64) -> BookingRow {
        let created = Utc::now() - ChronoDuration::minutes(minutes_ago);
        BookingRow {
            id: id.to_string(),
            customer_id: "c-1".to_string(),
            route_id: "airport-downtown".to_string(),
            car_type: "camry".to_string(),
            driver_id: None,
            agent_id: None,
            status: BookingStatus::Pending,
            pickup_time: created + ChronoDuration::hours(2),
            pickup_location: "Terminal 1".to_string(),
            special_instructions: None,
            price: 45.0,
            agent_commission: 0.0,
            agent_commission_paid: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn store(backend: Arc<MemoryBackend>) -> BookingStore {
        BookingStore::new(backend, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn orphaned_driver_and_agent_degrade_to_none() {
        let backend = seeded();
        let store = store(backend);

        let mut orphan = row("b-1", 0);
        orphan.status = BookingStatus::Assigned;
        orphan.driver_id = Some("driver-gone".to_string());
        orphan.agent_id = Some("agent-gone".to_string());

        store.insert(orphan).await.unwrap();

        let booking = store.get("b-1").await.unwrap();
        assert_eq!(booking.driver_id.as_deref(), Some("driver-gone"));
        assert!(booking.driver.is_none());
        assert!(booking.agent.is_none());
        assert_eq!(booking.customer.name, "Layla");
    }

    #[tokio::test]
    async fn unloadable_drivers_and_agents_leave_bookings_readable() {
        let backend = seeded();
        let store = store(backend.clone());
        let mut assigned = row("b-1", 0);
        assigned.status = BookingStatus::Assigned;
        assigned.driver_id = Some("driver-1".to_string());
        assigned.agent_id = Some("agent-1".to_string());
        store.insert(assigned).await.unwrap();

        backend.fail_table(DRIVERS);
        backend.fail_table(AGENTS);

        let bookings = store.list(&BookingFilter::default()).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].driver_id.as_deref(), Some("driver-1"));
        assert!(bookings[0].driver.is_none());
        assert!(bookings[0].agent.is_none());
    }

    #[tokio::test]
    async fn unloadable_routes_fail_the_read() {
        let backend = seeded();
        let store = store(backend.clone());
        store.insert(row("b-1", 0)).await.unwrap();

        backend.fail_table(ROUTES);

        let err = store.get("b-1").await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn missing_customer_is_a_data_integrity_error() {
        let backend = seeded();
        let store = store(backend.clone());
        store.insert(row("b-1", 0)).await.unwrap();

        backend.remove_customer("c-1");

        let err = store.get("b-1").await.unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let backend = seeded();
        let store = store(backend);
        store.insert(row("older", 30)).await.unwrap();
        store.insert(row("newer", 5)).await.unwrap();
        let mut assigned = row("assigned", 10);
        assigned.status = BookingStatus::Assigned;
        assigned.driver_id = Some("driver-1".to_string());
        store.insert(assigned).await.unwrap();

        let all = store.list(&BookingFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "assigned", "older"]);

        let pending = store
            .list(&BookingFilter {
                status: Some(BookingStatus::Pending),
                ..BookingFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let for_driver = store
            .list(&BookingFilter {
                driver_id: Some("driver-1".to_string()),
                ..BookingFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(for_driver.len(), 1);
        assert_eq!(for_driver[0].id, "assigned");
    }

    #[tokio::test]
    async fn removing_unknown_booking_is_not_found() {
        let store = store(seeded());
        let err = store.remove("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("missing")));
    }
}
