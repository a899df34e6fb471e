// packages/engine/src/payload.rs
//! Plane payload and total weight
//!
//! - Passenger plane: luggage + body weight per occupied seat, plus 7 crew
//! - Cargo plane: items × average item weight, plus 2 crew
//!
//! Crew members weigh a flat 75 kg each.

use crate::protocol::record::PlaneCategory;
use crate::utils::errors::{Result, SimError};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};

pub const CREW_MEMBER_WEIGHT: u32 = 75;
pub const PASSENGER_CREW: u32 = 7;
pub const CARGO_CREW: u32 = 2;

pub const MAX_SEATS: usize = 10;
pub const MAX_LUGGAGE_WEIGHT: u32 = 25;
pub const MIN_BODY_WEIGHT: u32 = 10;
pub const MAX_BODY_WEIGHT: u32 = 100;
pub const MAX_CARGO_ITEMS: u32 = 100;
pub const MAX_CARGO_ITEM_WEIGHT: u32 = 100;

/// One occupied seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub luggage_weight: u32,
    pub body_weight: u32,
}

impl Passenger {
    pub fn new(luggage_weight: u32, body_weight: u32) -> Result<Self> {
        validate_range("Luggage weight", luggage_weight, 0, MAX_LUGGAGE_WEIGHT)?;
        validate_range("Body weight", body_weight, MIN_BODY_WEIGHT, MAX_BODY_WEIGHT)?;
        Ok(Self {
            luggage_weight,
            body_weight,
        })
    }

    pub fn weight(&self) -> u32 {
        self.luggage_weight + self.body_weight
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerManifest {
    passengers: Vec<Passenger>,
}

impl PassengerManifest {
    pub fn new(passengers: Vec<Passenger>) -> Result<Self> {
        if passengers.is_empty() || passengers.len() > MAX_SEATS {
            return Err(SimError::ValidationFailed(format!(
                "Number of occupied seats must be between 1 and {}, got {}",
                MAX_SEATS,
                passengers.len()
            )));
        }
        Ok(Self { passengers })
    }

    pub fn seats(&self) -> u32 {
        self.passengers.len() as u32
    }

    pub fn weight(&self) -> u32 {
        let people: u32 = self.passengers.iter().map(Passenger::weight).sum();
        people + PASSENGER_CREW * CREW_MEMBER_WEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoManifest {
    pub items: u32,
    pub average_weight: u32,
}

impl CargoManifest {
    pub fn new(items: u32, average_weight: u32) -> Result<Self> {
        validate_range("Number of cargo items", items, 1, MAX_CARGO_ITEMS)?;
        validate_range(
            "Average cargo item weight",
            average_weight,
            1,
            MAX_CARGO_ITEM_WEIGHT,
        )?;
        Ok(Self {
            items,
            average_weight,
        })
    }

    pub fn weight(&self) -> u32 {
        self.items * self.average_weight + CARGO_CREW * CREW_MEMBER_WEIGHT
    }
}

/// What a plane carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Passenger(PassengerManifest),
    Cargo(CargoManifest),
    /// Pre-computed weight, used when the manifest is collected elsewhere
    Fixed { category: PlaneCategory, weight: u32, passengers: u32 },
}

impl Payload {
    pub fn total_weight(&self) -> u32 {
        match self {
            Payload::Passenger(manifest) => manifest.weight(),
            Payload::Cargo(manifest) => manifest.weight(),
            Payload::Fixed { weight, .. } => *weight,
        }
    }

    pub fn category(&self) -> PlaneCategory {
        match self {
            Payload::Passenger(_) => PlaneCategory::Passenger,
            Payload::Cargo(_) => PlaneCategory::Cargo,
            Payload::Fixed { category, .. } => *category,
        }
    }

    pub fn passengers(&self) -> u32 {
        match self {
            Payload::Passenger(manifest) => manifest.seats(),
            Payload::Cargo(_) => 0,
            Payload::Fixed {
                category: PlaneCategory::Passenger,
                passengers,
                ..
            } => *passengers,
            Payload::Fixed { .. } => 0,
        }
    }
}
