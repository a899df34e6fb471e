// packages/engine/src/protocol/record.rs
//! Flight record carried by value through every phase

use crate::payload::Payload;
use crate::protocol::phase::ProtocolPhase;
use crate::utils::errors::{Result, SimError};
use crate::utils::validation::{validate_plane_id, validate_route};
use serde::{Deserialize, Serialize};

/// Flag bit set on a completion record when the journey never ran
pub const FLAG_ABORTED: u32 = 0x1;

/// Plane ID reserved for control records
pub const CONTROL_PLANE_ID: u32 = 0;

/// Plane category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneCategory {
    Passenger,
    Cargo,
}

impl PlaneCategory {
    pub fn code(&self) -> i32 {
        match self {
            PlaneCategory::Passenger => 1,
            PlaneCategory::Cargo => 0,
        }
    }

    /// Any non-zero code is a passenger plane
    pub fn from_code(code: i32) -> Self {
        if code != 0 {
            PlaneCategory::Passenger
        } else {
            PlaneCategory::Cargo
        }
    }
}

/// One aircraft's journey state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Tag of the message this record last travelled in
    pub phase: ProtocolPhase,
    pub plane_id: u32,
    pub departure: u32,
    pub arrival: u32,
    pub weight: u32,
    pub category: PlaneCategory,
    /// Zero for cargo planes
    pub passengers: u32,
    pub flag: u32,
}

impl FlightRecord {
    /// Build a validated journey request
    pub fn new(plane_id: u32, departure: u32, arrival: u32, payload: &Payload) -> Result<Self> {
        validate_plane_id(plane_id)?;
        validate_route(departure, arrival)?;

        let weight = payload.total_weight();
        if weight == 0 {
            return Err(SimError::ValidationFailed(
                "Plane weight must be positive".to_string(),
            ));
        }

        Ok(Self {
            phase: ProtocolPhase::Request,
            plane_id,
            departure,
            arrival,
            weight,
            category: payload.category(),
            passengers: payload.passengers(),
            flag: 0,
        })
    }

    /// Control record carrying no journey, used for the shutdown signal.
    /// Its plane ID is [`CONTROL_PLANE_ID`], which no journey may use.
    pub fn control(phase: ProtocolPhase) -> Self {
        Self {
            phase,
            plane_id: CONTROL_PLANE_ID,
            departure: 0,
            arrival: 0,
            weight: 0,
            category: PlaneCategory::Cargo,
            passengers: 0,
            flag: 0,
        }
    }

    /// Copy of this record retagged for `phase`
    pub fn tagged(&self, phase: ProtocolPhase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.flag & FLAG_ABORTED != 0
    }

    pub fn mark_aborted(&mut self) {
        self.flag |= FLAG_ABORTED;
    }

    /// The line appended to the flight log once the plane has departed
    pub fn departure_notice(&self) -> String {
        format!(
            "Plane {} has departed from Airport {} and will land at Airport {}.",
            self.plane_id, self.departure, self.arrival
        )
    }
}
