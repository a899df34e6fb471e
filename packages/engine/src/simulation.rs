// packages/engine/src/simulation.rs
//! In-process simulation
//!
//! Runs the controller, every airport and a batch of aircraft as tasks of one
//! runtime, all attached to one in-memory channel resolved by name from a
//! [`ChannelRegistry`]. Pools are built and inputs checked before the channel
//! exists, so a rejected setup leaves no channel behind.

use crate::channel::{ChannelHandle, ChannelRegistry};
use crate::protocol::aircraft::{fly, JourneyOutcome};
use crate::protocol::airport::{AirportActor, AirportReport};
use crate::protocol::controller::{request_shutdown, Controller, ControllerReport};
use crate::protocol::record::FlightRecord;
use crate::recording::flight_log::FlightLog;
use crate::runway::pool::{RunwayPool, BACKUP_CAPACITY};
use crate::runway::service::ServiceTimes;
use crate::utils::errors::{Result, SimError};
use crate::utils::validation::{validate_airport_id, validate_plane_id, validate_runway_count};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// One airport and its regular runway capacities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportSpec {
    pub id: u32,
    pub capacities: Vec<u32>,
}

impl AirportSpec {
    pub fn new(id: u32, capacities: impl Into<Vec<u32>>) -> Self {
        Self {
            id,
            capacities: capacities.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub channel_name: String,
    pub airports: Vec<AirportSpec>,
    pub service: ServiceTimes,
    pub flight_log: FlightLog,
    /// Reject odd runway counts, as operator input does
    pub require_even_runways: bool,
    /// Fly all aircraft at once instead of one after another
    pub concurrent: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            channel_name: "atc-sim".to_string(),
            airports: Vec::new(),
            service: ServiceTimes::default(),
            flight_log: FlightLog::disabled(),
            require_even_runways: true,
            concurrent: false,
        }
    }
}

/// Everything the actors reported
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub controller: ControllerReport,
    /// Sorted by airport ID
    pub airports: Vec<AirportReport>,
    /// In the order the flights were given
    pub outcomes: Vec<JourneyOutcome>,
}

impl SimulationReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }
}

pub struct Simulation {
    registry: Arc<ChannelRegistry>,
    config: SimulationConfig,
    pools: Vec<Arc<RunwayPool>>,
}

impl Simulation {
    /// Validate the airports and build their runway pools
    pub fn new(registry: Arc<ChannelRegistry>, config: SimulationConfig) -> Result<Self> {
        if config.airports.is_empty() {
            return Err(SimError::ValidationFailed(
                "At least one airport is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut pools = Vec::with_capacity(config.airports.len());

        for airport in &config.airports {
            validate_airport_id(airport.id)?;
            if !seen.insert(airport.id) {
                return Err(SimError::ValidationFailed(format!(
                    "Airport {} configured twice",
                    airport.id
                )));
            }
            if config.require_even_runways {
                validate_runway_count(airport.capacities.len())?;
            }
            pools.push(Arc::new(RunwayPool::new(airport.id, &airport.capacities)?));
        }

        Ok(Self {
            registry,
            config,
            pools,
        })
    }

    pub fn pools(&self) -> &[Arc<RunwayPool>] {
        &self.pools
    }

    /// Fly every record, then shut the controller down
    pub async fn run(self, flights: Vec<FlightRecord>) -> Result<SimulationReport> {
        self.check_flights(&flights)?;

        let name = self.config.channel_name.clone();
        let channel: ChannelHandle = self.registry.create(&name);
        info!(
            "Simulation starting: {} airports, {} flights",
            self.pools.len(),
            flights.len()
        );

        let controller = tokio::spawn(
            Controller::new(channel.clone(), self.config.flight_log.clone()).run(),
        );

        let mut airports = JoinSet::new();
        for pool in &self.pools {
            let attached: ChannelHandle = self.registry.attach(&name)?;
            let actor = AirportActor::new(Arc::clone(pool), self.config.service, attached);
            airports.spawn(actor.run());
        }

        let flying = fly_all(channel.clone(), flights, self.config.concurrent);
        tokio::pin!(flying);

        let outcomes = tokio::select! {
            outcomes = &mut flying => outcomes?,
            Some(joined) = airports.join_next() => {
                // An airport stopped while journeys were still in flight
                let cause = match joined {
                    Ok(Ok(_)) => SimError::TaskFailed("airport stopped early".to_string()),
                    Ok(Err(e)) => e,
                    Err(e) => SimError::TaskFailed(format!("airport task: {}", e)),
                };
                error!("Aborting simulation: {}", cause);
                controller.abort();
                channel.teardown().await?;
                airports.shutdown().await;
                self.registry.remove(&name);
                return Err(cause);
            }
        };

        request_shutdown(&channel).await?;
        let controller = controller
            .await
            .map_err(|e| SimError::TaskFailed(format!("controller task: {}", e)))??;

        let mut reports = Vec::with_capacity(self.pools.len());
        while let Some(joined) = airports.join_next().await {
            let report = joined.map_err(|e| SimError::TaskFailed(format!("airport task: {}", e)))??;
            reports.push(report);
        }
        reports.sort_by_key(|r| r.airport_id);

        self.registry.remove(&name);
        info!("Simulation finished");

        Ok(SimulationReport {
            controller,
            airports: reports,
            outcomes,
        })
    }

    /// Every flight must use configured airports and a unique plane ID
    fn check_flights(&self, flights: &[FlightRecord]) -> Result<()> {
        let airports: HashSet<u32> = self.config.airports.iter().map(|a| a.id).collect();
        let mut planes = HashSet::new();

        for flight in flights {
            validate_plane_id(flight.plane_id)?;
            for id in [flight.departure, flight.arrival] {
                if !airports.contains(&id) {
                    return Err(SimError::ValidationFailed(format!(
                        "Plane {} uses airport {}, which is not configured",
                        flight.plane_id, id
                    )));
                }
            }
            if flight.weight == 0 || flight.weight > BACKUP_CAPACITY {
                return Err(SimError::ValidationFailed(format!(
                    "Plane {} weight {} outside 1..={}",
                    flight.plane_id, flight.weight, BACKUP_CAPACITY
                )));
            }
            if !planes.insert(flight.plane_id) {
                return Err(SimError::ValidationFailed(format!(
                    "Plane ID {} used by more than one flight",
                    flight.plane_id
                )));
            }
        }
        Ok(())
    }
}

async fn fly_all(
    channel: ChannelHandle,
    flights: Vec<FlightRecord>,
    concurrent: bool,
) -> Result<Vec<JourneyOutcome>> {
    if !concurrent {
        let mut outcomes = Vec::with_capacity(flights.len());
        for flight in &flights {
            outcomes.push(fly(&channel, flight).await?);
        }
        return Ok(outcomes);
    }

    // Polled together on this task; results keep the input order
    try_join_all(flights.iter().map(|flight| fly(&channel, flight))).await
}
