// packages/engine/src/recording/mod.rs
//! Persistent records of what the simulation did
//!
//! - **Flight log**: append-only departure notices written by the controller

pub mod flight_log;

pub use flight_log::FlightLog;
