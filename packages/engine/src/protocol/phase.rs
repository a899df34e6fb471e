// packages/engine/src/protocol/phase.rs
//! Protocol phases
//!
//! Every message on the shared channel is tagged with one phase. A journey
//! moves strictly through `Request → Departure → DepartureCleared → Arrival →
//! ArrivalAccepted → Complete`; `Shutdown` stops the controller.

use crate::utils::errors::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message tag, with the wire codes shared by every actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolPhase {
    /// aircraft → controller
    Request,
    /// controller → departure airport
    Departure,
    /// departure airport → controller
    DepartureCleared,
    /// controller → arrival airport
    Arrival,
    /// arrival airport → controller
    ArrivalAccepted,
    /// controller → aircraft
    Complete,
    /// shutdown signal picked up by the controller
    Shutdown,
}

impl ProtocolPhase {
    /// Journey phases in protocol order
    pub const JOURNEY: [ProtocolPhase; 6] = [
        ProtocolPhase::Request,
        ProtocolPhase::Departure,
        ProtocolPhase::DepartureCleared,
        ProtocolPhase::Arrival,
        ProtocolPhase::ArrivalAccepted,
        ProtocolPhase::Complete,
    ];

    pub fn code(&self) -> i64 {
        match self {
            ProtocolPhase::Request => 1,
            ProtocolPhase::Departure => 2,
            ProtocolPhase::DepartureCleared => 3,
            ProtocolPhase::Arrival => 4,
            ProtocolPhase::ArrivalAccepted => 5,
            ProtocolPhase::Complete => 6,
            ProtocolPhase::Shutdown => 999,
        }
    }

    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(ProtocolPhase::Request),
            2 => Ok(ProtocolPhase::Departure),
            3 => Ok(ProtocolPhase::DepartureCleared),
            4 => Ok(ProtocolPhase::Arrival),
            5 => Ok(ProtocolPhase::ArrivalAccepted),
            6 => Ok(ProtocolPhase::Complete),
            999 => Ok(ProtocolPhase::Shutdown),
            other => Err(SimError::Codec(format!("unknown phase tag {}", other))),
        }
    }

    /// Label used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolPhase::Request => "request",
            ProtocolPhase::Departure => "departure",
            ProtocolPhase::DepartureCleared => "departure_cleared",
            ProtocolPhase::Arrival => "arrival",
            ProtocolPhase::ArrivalAccepted => "arrival_accepted",
            ProtocolPhase::Complete => "complete",
            ProtocolPhase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for ProtocolPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.as_str(), self.code())
    }
}
