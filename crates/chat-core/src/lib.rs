pub mod ports;
pub mod decoder;
pub mod reducer;
pub mod event_bus;
pub mod auth;
pub mod session;
