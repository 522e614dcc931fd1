pub mod actor;
pub mod agent;
pub mod booking;
pub mod car_type;
pub mod customer;
pub mod driver;
pub mod route;
