// packages/engine/src/runway/service.rs
//! Simulated service time on a runway
//!
//! Departures board/load; arrivals land and then deboard/unload. Durations are
//! injected so tests can run with [`ServiceTimes::instant`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

/// Which leg of a journey an allocation serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Departure,
    Arrival,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leg::Departure => "departure",
            Leg::Arrival => "arrival",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimes {
    pub boarding: Duration,
    pub landing: Duration,
    pub deboarding: Duration,
}

impl Default for ServiceTimes {
    fn default() -> Self {
        Self {
            boarding: Duration::from_secs(3),
            landing: Duration::from_secs(2),
            deboarding: Duration::from_secs(3),
        }
    }
}

impl ServiceTimes {
    /// No delay at all
    pub fn instant() -> Self {
        Self {
            boarding: Duration::ZERO,
            landing: Duration::ZERO,
            deboarding: Duration::ZERO,
        }
    }

    /// Same delay for every stage
    pub fn uniform(stage: Duration) -> Self {
        Self {
            boarding: stage,
            landing: stage,
            deboarding: stage,
        }
    }

    /// Total time a runway is held for `leg`
    pub fn total(&self, leg: Leg) -> Duration {
        match leg {
            Leg::Departure => self.boarding,
            Leg::Arrival => self.landing + self.deboarding,
        }
    }

    /// Sleep through every stage of `leg`
    pub async fn simulate(&self, leg: Leg) {
        match leg {
            Leg::Departure => {
                trace!("Boarding/loading for {:?}", self.boarding);
                pause(self.boarding).await;
            }
            Leg::Arrival => {
                trace!("Landing for {:?}", self.landing);
                pause(self.landing).await;
                trace!("Deboarding/unloading for {:?}", self.deboarding);
                pause(self.deboarding).await;
            }
        }
    }
}

async fn pause(duration: Duration) {
    if duration.is_zero() {
        // Still give other tasks a turn
        tokio::task::yield_now().await;
    } else {
        sleep(duration).await;
    }
}
