// packages/engine/src/protocol/mod.rs
//! Coordination protocol
//!
//! Three kinds of actor exchange [`FlightRecord`]s over a shared channel:
//!
//! - **Aircraft**: submits a request and waits for its completion
//! - **Controller**: sequences one journey at a time and owns shutdown
//! - **Airport**: services the legs that involve its own runways
//!
//! A journey is the phase sequence 1 → 2 → 3 → 4 → 5 → 6; phase 999 stops
//! the controller.

pub mod aircraft;
pub mod airport;
pub mod codec;
pub mod controller;
pub mod phase;
pub mod record;

pub use aircraft::{fly, JourneyOutcome};
pub use airport::{AirportActor, AirportReport};
pub use controller::{request_shutdown, Controller, ControllerConfig, ControllerReport, JourneyTrace};
pub use phase::ProtocolPhase;
pub use record::{FlightRecord, PlaneCategory, CONTROL_PLANE_ID, FLAG_ABORTED};
