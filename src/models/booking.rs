use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;
use crate::models::customer::{Customer, CustomerDetails};
use crate::models::driver::Driver;
use crate::models::route::Route;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Assigned,
    Pickup,
    Drop,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Assigned,
        BookingStatus::Pickup,
        BookingStatus::Drop,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Pickup => "pickup",
            BookingStatus::Drop => "drop",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses in which a booking must carry a driver.
    pub fn requires_driver(self) -> bool {
        matches!(
            self,
            BookingStatus::Assigned
                | BookingStatus::Pickup
                | BookingStatus::Drop
                | BookingStatus::Completed
        )
    }

    /// The ride progresses pending → assigned → pickup → drop → completed.
    /// Any non-terminal booking can also be released back to pending.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        match (self, next) {
            (from, BookingStatus::Pending) => !from.is_terminal(),
            (BookingStatus::Pending, BookingStatus::Assigned)
            | (BookingStatus::Assigned, BookingStatus::Pickup)
            | (BookingStatus::Pickup, BookingStatus::Drop)
            | (BookingStatus::Drop, BookingStatus::Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown booking status: {s}"))
    }
}

/// A booking with every relation resolved, as handed to views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub customer: Customer,
    pub route_id: String,
    pub route: Route,
    pub car_type: String,
    pub driver_id: Option<String>,
    pub driver: Option<Driver>,
    pub agent_id: Option<String>,
    pub agent: Option<Agent>,
    pub status: BookingStatus,
    pub pickup_time: DateTime<Utc>,
    pub pickup_location: String,
    pub special_instructions: Option<String>,
    pub price: f64,
    pub agent_commission: f64,
    pub commission_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking intent submitted by a guest, agent, CSR or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub customer: CustomerDetails,
    pub route_id: String,
    pub car_type: String,
    pub pickup_time: String,
    pub pickup_location: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub agent_commission: Option<f64>,
    /// Manual fare entry; the route fare applies when absent.
    #[serde(default)]
    pub price: Option<f64>,
}

/// Field-level edit of an existing booking. Only these fields are editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookingPatch {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub agent_commission: Option<f64>,
    #[serde(default)]
    pub commission_paid: Option<bool>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<String>,
}

impl BookingPatch {
    pub fn commission_paid() -> Self {
        Self {
            commission_paid: Some(true),
            ..Self::default()
        }
    }
}
