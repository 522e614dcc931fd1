//! Flat snake_case rows as stored by the persistence backend, and the
//! mapping to and from the domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::car_type::CarType;
use crate::models::customer::Customer;
use crate::models::driver::Driver;
use crate::models::route::Route;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarTypeRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub capacity: u32,
    pub features: Vec<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRow {
    pub id: String,
    pub from_location: String,
    pub to_location: String,
    pub distance: String,
    pub duration: String,
    pub pricing: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub car_type: String,
    pub car_model: String,
    pub plate_number: String,
    pub rating: f64,
    pub is_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub bookings_created: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRow {
    pub id: String,
    pub customer_id: String,
    pub route_id: String,
    pub car_type: String,
    pub driver_id: Option<String>,
    pub agent_id: Option<String>,
    pub status: BookingStatus,
    pub pickup_time: DateTime<Utc>,
    pub pickup_location: String,
    pub special_instructions: Option<String>,
    pub price: f64,
    pub agent_commission: f64,
    pub agent_commission_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CarTypeRow> for CarType {
    fn from(row: CarTypeRow) -> Self {
        CarType {
            id: row.id,
            name: row.name,
            description: row.description,
            capacity: row.capacity,
            features: row.features,
            icon: row.icon,
        }
    }
}

impl From<&CarType> for CarTypeRow {
    fn from(car_type: &CarType) -> Self {
        CarTypeRow {
            id: car_type.id.clone(),
            name: car_type.name.clone(),
            description: car_type.description.clone(),
            capacity: car_type.capacity,
            features: car_type.features.clone(),
            icon: car_type.icon.clone(),
        }
    }
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            from: row.from_location,
            to: row.to_location,
            distance: row.distance,
            duration: row.duration,
            pricing: row.pricing,
        }
    }
}

impl From<&Route> for RouteRow {
    fn from(route: &Route) -> Self {
        RouteRow {
            id: route.id.clone(),
            from_location: route.from.clone(),
            to_location: route.to.clone(),
            distance: route.distance.clone(),
            duration: route.duration.clone(),
            pricing: route.pricing.clone(),
        }
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
        }
    }
}

impl From<&Customer> for CustomerRow {
    fn from(customer: &Customer) -> Self {
        CustomerRow {
            id: customer.id.clone(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
        }
    }
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Driver {
            id: row.id,
            name: row.name,
            phone: row.phone,
            car_type: row.car_type,
            car_model: row.car_model,
            plate_number: row.plate_number,
            rating: row.rating,
            is_online: row.is_online,
        }
    }
}

impl From<&Driver> for DriverRow {
    fn from(driver: &Driver) -> Self {
        DriverRow {
            id: driver.id.clone(),
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            car_type: driver.car_type.clone(),
            car_model: driver.car_model.clone(),
            plate_number: driver.plate_number.clone(),
            rating: driver.rating,
            is_online: driver.is_online,
        }
    }
}

impl From<AgentRow> for Agent {
    fn from(row: AgentRow) -> Self {
        Agent {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            bookings_created: row.bookings_created,
        }
    }
}

impl From<&Agent> for AgentRow {
    fn from(agent: &Agent) -> Self {
        AgentRow {
            id: agent.id.clone(),
            name: agent.name.clone(),
            phone: agent.phone.clone(),
            email: agent.email.clone(),
            bookings_created: agent.bookings_created,
        }
    }
}

/// Drops the enriched relations; every remaining field maps one to one.
impl From<&Booking> for BookingRow {
    fn from(booking: &Booking) -> Self {
        BookingRow {
            id: booking.id.clone(),
            customer_id: booking.customer_id.clone(),
            route_id: booking.route_id.clone(),
            car_type: booking.car_type.clone(),
            driver_id: booking.driver_id.clone(),
            agent_id: booking.agent_id.clone(),
            status: booking.status,
            pickup_time: booking.pickup_time,
            pickup_location: booking.pickup_location.clone(),
            special_instructions: booking.special_instructions.clone(),
            price: booking.price,
            agent_commission: booking.agent_commission,
            agent_commission_paid: booking.commission_paid,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Related records resolved for one booking row.
pub struct Relations {
    pub customer: Customer,
    pub route: Route,
    pub driver: Option<Driver>,
    pub agent: Option<Agent>,
}

impl BookingRow {
    pub fn into_booking(self, relations: Relations) -> Booking {
        Booking {
            id: self.id,
            customer_id: self.customer_id,
            customer: relations.customer,
            route_id: self.route_id,
            route: relations.route,
            car_type: self.car_type,
            driver_id: self.driver_id,
            driver: relations.driver,
            agent_id: self.agent_id,
            agent: relations.agent,
            status: self.status,
            pickup_time: self.pickup_time,
            pickup_location: self.pickup_location,
            special_instructions: self.special_instructions,
            price: self.price,
            agent_commission: self.agent_commission,
            commission_paid: self.agent_commission_paid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
