// packages/engine/src/lib.rs
//! Air Traffic Coordination Simulator
//!
//! Aircraft, a controller and airports coordinate journeys by exchanging
//! phase-tagged flight records over one shared channel. Each airport assigns
//! runways to planes with a best-fit allocator backed by an oversized backup
//! runway.
//!
//! # Architecture
//!
//! - **channel**: shared mailbox (in-memory or System V message queue)
//! - **protocol**: phases, records, wire codec and the three actor roles
//! - **runway**: runway pool, allocation engine and service timing
//! - **payload**: plane weight from passenger or cargo manifests
//! - **recording**: departure flight log
//! - **simulation**: all actors in one process
//! - **observability**: tracing and metrics setup
//! - **utils**: configuration, errors, input validation

pub mod channel;
pub mod observability;
pub mod payload;
pub mod protocol;
pub mod recording;
pub mod runway;
pub mod simulation;
pub mod utils;

pub use channel::{ChannelHandle, ChannelRegistry, MemoryChannel, Selector, SharedChannel};
pub use protocol::{AirportActor, Controller, FlightRecord, JourneyOutcome, ProtocolPhase};
pub use runway::{AllocationEngine, RunwayPool};
pub use simulation::{AirportSpec, Simulation, SimulationConfig, SimulationReport};
pub use utils::config::SimConfig;
pub use utils::errors::{Result, SimError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
