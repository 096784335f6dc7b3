pub mod auth;
pub mod destinations;
pub mod events;
pub mod reservations;
pub mod uploads;
