use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::locks::BookingLocks;
use crate::engine::validation::{
    optional_text, require_non_empty, validate_commission, validate_phone, validate_pickup_time,
    validate_price,
};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::booking::{Booking, BookingPatch, BookingStatus, NewBooking};
use crate::models::customer::{Customer, CustomerDetails};
use crate::models::driver::Driver;
use crate::notifier::{ChangeKind, ChangeNotifier, EntityType};
use crate::observability::metrics::Metrics;
use crate::store::backend::Backend;
use crate::store::booking_store::BookingStore;
use crate::store::directory::Directory;
use crate::store::guarded;
use crate::store::rows::{BookingRow, CustomerRow};

/// The driver named in a status change, and whether it was already looked up.
enum DriverSelection {
    Unchecked(String),
    Verified(String),
}

/// Applies every booking mutation: validation, the status machine, the
/// financial rules, persistence and the change notification.
///
/// Each mutation is one read-validate-write sequence against the backend.
/// Nothing is changed or published unless the write is confirmed.
#[derive(Clone)]
pub struct BookingEngine {
    backend: Arc<dyn Backend>,
    store: BookingStore,
    directory: Directory,
    notifier: ChangeNotifier,
    metrics: Metrics,
    locks: Arc<BookingLocks>,
    timeout: Duration,
}

impl BookingEngine {
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: ChangeNotifier,
        metrics: Metrics,
        timeout: Duration,
    ) -> Self {
        Self {
            store: BookingStore::new(backend.clone(), timeout),
            directory: Directory::new(backend.clone(), timeout),
            backend,
            notifier,
            metrics,
            locks: Arc::new(BookingLocks::new()),
            timeout,
        }
    }

    pub fn store(&self) -> &BookingStore {
        &self.store
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub async fn create_booking(&self, actor: &Actor, input: NewBooking) -> Result<Booking, AppError> {
        let result = self.try_create_booking(actor, input).await;
        self.observe("create", actor, &result);
        result
    }

    pub async fn update_booking_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        status: BookingStatus,
        driver_id: Option<String>,
    ) -> Result<Booking, AppError> {
        let driver = driver_id.map(DriverSelection::Unchecked);
        let result = self
            .try_update_status(actor, booking_id, status, driver)
            .await;
        self.observe("update_status", actor, &result);
        result
    }

    /// Moves a pending booking to `assigned` for `driver_id`. The driver's
    /// car type is not compared with the booking's.
    pub async fn assign_booking_to_driver(
        &self,
        actor: &Actor,
        booking_id: &str,
        driver_id: &str,
    ) -> Result<Booking, AppError> {
        let result: Result<Booking, AppError> = async {
            let driver = self.directory.driver(driver_id).await?;
            self.try_update_status(
                actor,
                booking_id,
                BookingStatus::Assigned,
                Some(DriverSelection::Verified(driver.id)),
            )
            .await
        }
        .await;
        self.observe("assign", actor, &result);
        result
    }

    /// Puts the booking back in the pending pool and clears its driver.
    pub async fn release_booking_from_driver(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<Booking, AppError> {
        self.update_booking_status(actor, booking_id, BookingStatus::Pending, None)
            .await
    }

    pub async fn update_booking(
        &self,
        actor: &Actor,
        booking_id: &str,
        patch: BookingPatch,
    ) -> Result<Booking, AppError> {
        let result = self.try_update_booking(actor, booking_id, patch).await;
        self.observe("update", actor, &result);
        result
    }

    /// Idempotent: marking an already paid commission returns the booking
    /// unchanged.
    pub async fn mark_commission_as_paid(
        &self,
        actor: &Actor,
        booking_id: &str,
    ) -> Result<Booking, AppError> {
        self.update_booking(actor, booking_id, BookingPatch::commission_paid())
            .await
    }

    pub async fn delete_booking(&self, actor: &Actor, booking_id: &str) -> Result<(), AppError> {
        let result = self.try_delete_booking(actor, booking_id).await;
        self.observe("delete", actor, &result);
        result
    }

    /// The driver's own availability toggle.
    pub async fn set_driver_online(
        &self,
        actor: &Actor,
        driver_id: &str,
        is_online: bool,
    ) -> Result<Driver, AppError> {
        let result = guarded(
            self.timeout,
            "set driver online",
            self.backend.set_driver_online(driver_id, is_online),
        )
        .await
        .map(Driver::from)
        .map_err(|err| match err {
            AppError::NotFound(_) => AppError::NotFound(format!("driver {driver_id} not found")),
            other => other,
        });

        if result.is_ok() {
            self.notifier
                .publish(EntityType::Driver, driver_id, ChangeKind::Updated);
            info!(driver_id = %driver_id, is_online, actor = %actor.id, "driver availability changed");
        }
        self.observe("set_driver_online", actor, &result);
        result
    }

    async fn try_create_booking(&self, actor: &Actor, input: NewBooking) -> Result<Booking, AppError> {
        let now = Utc::now();

        let name = require_non_empty(&input.customer.name, "customer name")?;
        let phone = validate_phone(&input.customer.phone)?;
        let route = self.directory.route(input.route_id.trim()).await?;
        let car_type = self.directory.car_type(input.car_type.trim()).await?;
        let route_price = route.price_for(&car_type.id).ok_or_else(|| {
            AppError::Validation(format!(
                "car type {} is not offered on route {}",
                car_type.id, route.id
            ))
        })?;
        let pickup_time = validate_pickup_time(&input.pickup_time, now)?;
        let pickup_location = require_non_empty(&input.pickup_location, "pickup location")?;
        let price = validate_price(input.price.unwrap_or(route_price))?;
        let agent_commission = validate_commission(input.agent_commission.unwrap_or(0.0))?;

        let customer = self
            .resolve_customer(CustomerDetails {
                name,
                phone,
                email: optional_text(input.customer.email.as_deref()),
            })
            .await?;
        let agent_id = self.resolve_agent(actor).await?;

        let row = BookingRow {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id,
            route_id: route.id,
            car_type: car_type.id,
            driver_id: None,
            agent_id: agent_id.clone(),
            status: BookingStatus::Pending,
            pickup_time,
            pickup_location,
            special_instructions: optional_text(input.special_instructions.as_deref()),
            price,
            agent_commission,
            agent_commission_paid: false,
            created_at: now,
            updated_at: now,
        };

        let row = self.store.insert(row).await?;

        if let Some(agent_id) = &agent_id {
            // The booking is already committed; a lost increment is logged
            // rather than reported as a failed creation.
            if let Err(err) = guarded(
                self.timeout,
                "increment agent bookings",
                self.backend.increment_agent_bookings(agent_id),
            )
            .await
            {
                error!(agent_id = %agent_id, booking_id = %row.id, error = %err, "failed to count agent booking");
            }
        }

        self.notifier
            .publish(EntityType::Booking, &row.id, ChangeKind::Created);
        self.metrics.bookings_created_total.inc();

        info!(
            booking_id = %row.id,
            customer_id = %row.customer_id,
            agent_id = ?row.agent_id,
            price = row.price,
            actor = %actor.id,
            role = %actor.role,
            "booking created"
        );

        self.committed(row).await
    }

    async fn try_update_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        status: BookingStatus,
        driver: Option<DriverSelection>,
    ) -> Result<Booking, AppError> {
        let _guard = self.locks.acquire(booking_id).await;
        let mut row = self.store.get_row(booking_id).await?;
        let from = row.status;

        if !from.can_transition_to(status) {
            return Err(AppError::status_transition(from, status));
        }

        let driver_id = match (status, driver) {
            (BookingStatus::Pending, _) => None,
            (_, Some(DriverSelection::Verified(driver_id))) => Some(driver_id),
            (_, Some(DriverSelection::Unchecked(driver_id))) => {
                self.directory.driver(&driver_id).await?;
                Some(driver_id)
            }
            (BookingStatus::Assigned, None) => {
                return Err(AppError::Validation(
                    "a driver is required to assign a booking".to_string(),
                ));
            }
            (_, None) => row.driver_id.take(),
        };

        if status.requires_driver() && driver_id.is_none() {
            return Err(AppError::Validation(format!(
                "booking {booking_id} has no driver and cannot move to {status}"
            )));
        }

        row.status = status;
        row.driver_id = driver_id;
        row.updated_at = Utc::now();

        let row = self.store.replace(row).await?;
        self.notifier
            .publish(EntityType::Booking, booking_id, ChangeKind::Updated);
        self.metrics
            .booking_transitions_total
            .with_label_values(&[status.as_str()])
            .inc();

        info!(
            booking_id = %booking_id,
            from = %from,
            to = %status,
            driver_id = ?row.driver_id,
            actor = %actor.id,
            "booking status changed"
        );

        self.committed(row).await
    }

    async fn try_update_booking(
        &self,
        actor: &Actor,
        booking_id: &str,
        patch: BookingPatch,
    ) -> Result<Booking, AppError> {
        let now = Utc::now();
        let _guard = self.locks.acquire(booking_id).await;
        let original = self.store.get_row(booking_id).await?;
        let mut row = original.clone();

        if let Some(price) = patch.price {
            row.price = validate_price(price)?;
        }
        if let Some(commission) = patch.agent_commission {
            row.agent_commission = validate_commission(commission)?;
        }
        if let Some(paid) = patch.commission_paid {
            if row.agent_commission_paid && !paid {
                return Err(AppError::InvalidTransition(format!(
                    "commission for booking {booking_id} is already paid and cannot be marked unpaid"
                )));
            }
            row.agent_commission_paid = paid;
        }
        if let Some(instructions) = patch.special_instructions.as_deref() {
            row.special_instructions = optional_text(Some(instructions));
        }
        if let Some(pickup_time) = patch.pickup_time.as_deref() {
            row.pickup_time = validate_pickup_time(pickup_time, now)?;
        }
        if let Some(location) = patch.pickup_location.as_deref() {
            row.pickup_location = require_non_empty(location, "pickup location")?;
        }

        if row == original {
            debug!(booking_id = %booking_id, "booking update changed nothing");
            return self.store.enrich(row).await;
        }

        row.updated_at = now;
        let row = self.store.replace(row).await?;
        self.notifier
            .publish(EntityType::Booking, booking_id, ChangeKind::Updated);

        info!(
            booking_id = %booking_id,
            price = row.price,
            agent_commission = row.agent_commission,
            commission_paid = row.agent_commission_paid,
            actor = %actor.id,
            "booking updated"
        );

        self.committed(row).await
    }

    async fn try_delete_booking(&self, actor: &Actor, booking_id: &str) -> Result<(), AppError> {
        let _guard = self.locks.acquire(booking_id).await;
        self.store.remove(booking_id).await?;
        self.notifier
            .publish(EntityType::Booking, booking_id, ChangeKind::Deleted);

        info!(booking_id = %booking_id, actor = %actor.id, "booking deleted");
        Ok(())
    }

    /// The enriched view of a row that is already stored and published. A
    /// failed lookup here cannot undo the write, so the error says so.
    async fn committed(&self, row: BookingRow) -> Result<Booking, AppError> {
        let booking_id = row.id.clone();
        self.store.enrich(row).await.map_err(|err| {
            AppError::Dependency(format!(
                "booking {booking_id} was saved but could not be reloaded: {err}"
            ))
        })
    }

    /// Phone is the customer's natural key: an existing record is reused as
    /// is, otherwise one is created.
    async fn resolve_customer(&self, details: CustomerDetails) -> Result<Customer, AppError> {
        if let Some(existing) = self.find_customer(&details.phone).await? {
            debug!(customer_id = %existing.id, "reusing customer");
            return Ok(existing);
        }

        let row = CustomerRow {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            phone: details.phone.clone(),
            email: details.email,
        };

        match guarded(self.timeout, "create customer", self.backend.insert_customer(row)).await {
            Ok(row) => {
                info!(customer_id = %row.id, "customer created");
                Ok(Customer::from(row))
            }
            // Another request created this phone first.
            Err(AppError::Conflict(_)) => self.find_customer(&details.phone).await?.ok_or_else(|| {
                AppError::Dependency("customer vanished after duplicate phone".to_string())
            }),
            Err(err) => Err(AppError::Dependency(format!("failed to create customer: {err}"))),
        }
    }

    async fn find_customer(&self, phone: &str) -> Result<Option<Customer>, AppError> {
        guarded(
            self.timeout,
            "find customer",
            self.backend.find_customer_by_phone(phone),
        )
        .await
        .map(|row| row.map(Customer::from))
        .map_err(|err| AppError::Dependency(format!("failed to look up customer: {err}")))
    }

    /// The agent record behind an agent actor, matched by id and then by
    /// email. Any other role books without an agent.
    async fn resolve_agent(&self, actor: &Actor) -> Result<Option<String>, AppError> {
        if !actor.is_agent() {
            return Ok(None);
        }

        let lookup_failed =
            |err: AppError| AppError::Dependency(format!("failed to look up agent: {err}"));

        let by_id = guarded(self.timeout, "get agent", self.backend.get_agent(&actor.id))
            .await
            .map_err(lookup_failed)?;
        if let Some(agent) = by_id {
            return Ok(Some(agent.id));
        }

        if !actor.email.trim().is_empty() {
            let by_email = guarded(
                self.timeout,
                "find agent",
                self.backend.find_agent_by_email(actor.email.trim()),
            )
            .await
            .map_err(lookup_failed)?;
            if let Some(agent) = by_email {
                return Ok(Some(agent.id));
            }
        }

        warn!(actor = %actor.id, email = %actor.email, "agent actor has no agent record; booking is unattributed");
        Ok(None)
    }

    fn observe<T>(&self, operation: &'static str, actor: &Actor, result: &Result<T, AppError>) {
        let Err(err) = result else {
            return;
        };

        self.metrics
            .booking_operation_errors_total
            .with_label_values(&[operation, err.kind()])
            .inc();

        match err {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::InvalidTransition(_)
            | AppError::Conflict(_) => {
                warn!(operation, actor = %actor.id, error = %err, "booking operation rejected");
            }
            _ => {
                error!(operation, actor = %actor.id, error = %err, "booking operation failed");
            }
        }
    }
}
