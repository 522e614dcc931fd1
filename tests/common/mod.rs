#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use ride_booking::models::actor::{Actor, Role};
use ride_booking::models::agent::Agent;
use ride_booking::models::booking::NewBooking;
use ride_booking::models::car_type::CarType;
use ride_booking::models::customer::CustomerDetails;
use ride_booking::models::driver::Driver;
use ride_booking::models::route::Route;
use ride_booking::state::AppState;
use ride_booking::store::memory::MemoryBackend;
use tokio::time::Duration;

pub const PHONE: &str = "+966501234567";

pub fn setup() -> (Arc<AppState>, Arc<MemoryBackend>) {
    setup_with(1024, Duration::from_secs(2))
}

pub fn setup_with(buffer: usize, timeout: Duration) -> (Arc<AppState>, Arc<MemoryBackend>) {
    let (state, backend) = AppState::in_memory(buffer, timeout);
    seed(&backend);
    (Arc::new(state), backend)
}

fn car_type(id: &str, name: &str, capacity: u32) -> CarType {
    CarType {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} ride"),
        capacity,
        features: vec!["AC".to_string()],
        icon: "car".to_string(),
    }
}

fn route(id: &str, from: &str, to: &str, pricing: &[(&str, f64)]) -> Route {
    Route {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        distance: "10 km".to_string(),
        duration: "15 min".to_string(),
        pricing: pricing
            .iter()
            .map(|(car, price)| (car.to_string(), *price))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn driver(id: &str, name: &str, car_type: &str, is_online: bool) -> Driver {
    Driver {
        id: id.to_string(),
        name: name.to_string(),
        phone: "+1234567890".to_string(),
        car_type: car_type.to_string(),
        car_model: format!("{car_type} 2024"),
        plate_number: format!("{}-001", car_type.to_uppercase()),
        rating: 4.8,
        is_online,
    }
}

pub fn seed(backend: &MemoryBackend) {
    backend.put_car_type(&car_type("camry", "Toyota Camry", 4));
    backend.put_car_type(&car_type("starx", "Starx SUV", 6));
    backend.put_car_type(&car_type("gmc", "GMC Suburban", 8));
    backend.put_car_type(&car_type("hiace", "Toyota Hiace", 14));

    backend.put_route(&route(
        "airport-downtown",
        "International Airport",
        "Downtown Business District",
        &[("camry", 45.0), ("starx", 60.0), ("gmc", 85.0), ("hiace", 120.0)],
    ));
    backend.put_route(&route(
        "hotel-conference",
        "Luxury Hotel District",
        "Convention Center",
        &[("camry", 20.0), ("starx", 28.0)],
    ));

    backend.put_driver(&driver("driver-1", "Ahmed Hassan", "camry", true));
    backend.put_driver(&driver("driver-2", "Sarah Johnson", "starx", true));
    backend.put_driver(&driver("driver-3", "Mohammed Ali", "camry", false));

    backend.put_agent(&Agent {
        id: "agent-1".to_string(),
        name: "Omar Travel".to_string(),
        phone: "+966500000001".to_string(),
        email: "omar@agency.example".to_string(),
        bookings_created: 0,
    });
}

pub fn in_minutes(minutes: i64) -> String {
    (Utc::now() + ChronoDuration::minutes(minutes)).to_rfc3339()
}

pub fn new_booking(phone: &str, name: &str) -> NewBooking {
    NewBooking {
        customer: CustomerDetails {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
        },
        route_id: "airport-downtown".to_string(),
        car_type: "camry".to_string(),
        pickup_time: in_minutes(30),
        pickup_location: "Terminal 1, Gate B".to_string(),
        special_instructions: None,
        agent_commission: None,
        price: None,
    }
}

pub fn admin() -> Actor {
    Actor::new("admin-1", "Admin", "admin@example.com", Role::Admin)
}

pub fn agent() -> Actor {
    Actor::new("agent-1", "Omar Travel", "omar@agency.example", Role::Agent)
}

pub fn csr() -> Actor {
    Actor::new("csr-1", "Nadia", "nadia@example.com", Role::Csr)
}

pub fn driver_actor(id: &str) -> Actor {
    Actor::new(id, id, format!("{id}@example.com"), Role::Driver)
}
