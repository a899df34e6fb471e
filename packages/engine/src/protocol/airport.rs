// packages/engine/src/protocol/airport.rs
//! Airport actor
//!
//! The airport takes departure relays (phase 2) and arrival relays (phase 4)
//! in the order they were sent. For each it decides its role by comparing
//! the record's airport IDs with its own:
//!
//! - departure leg: service the departure, then report phase 3
//! - arrival leg: report phase 5, then service the arrival in the background
//! - neither: put the message back unchanged for the airport it belongs to
//!
//! Departure and arrival tasks share the airport's runway pool and may
//! overlap. The actor stops when the controller tears the channel down.

use crate::channel::{ChannelHandle, Selector};
use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::runway::allocator::{AllocationEngine, AllocationRequest, Assignment};
use crate::runway::pool::{RunwayPool, RunwayStatus};
use crate::runway::service::{Leg, ServiceTimes};
use crate::utils::errors::{Result, SimError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Pause after passing a message through
const RELAY_BACKOFF: Duration = Duration::from_millis(2);

/// What an airport did before it stopped
#[derive(Debug, Clone, Default, Serialize)]
pub struct AirportReport {
    pub airport_id: u32,
    pub departures: Vec<Assignment>,
    pub arrivals: Vec<Assignment>,
    /// Messages passed through because they belonged to another airport
    pub relayed: u32,
    /// Runway states once every service task has finished
    pub runways: Vec<RunwayStatus>,
}

pub struct AirportActor {
    id: u32,
    channel: ChannelHandle,
    engine: Arc<AllocationEngine>,
    arrivals: JoinSet<Result<Assignment>>,
    report: AirportReport,
}

impl AirportActor {
    pub fn new(pool: Arc<RunwayPool>, service: ServiceTimes, channel: ChannelHandle) -> Self {
        let id = pool.airport_id();
        Self {
            id,
            channel,
            engine: Arc::new(AllocationEngine::new(pool, service)),
            arrivals: JoinSet::new(),
            report: AirportReport {
                airport_id: id,
                ..Default::default()
            },
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn pool(&self) -> &Arc<RunwayPool> {
        self.engine.pool()
    }

    /// Serve journeys until the channel is torn down
    pub async fn run(mut self) -> Result<AirportReport> {
        info!("Airport {} waiting for traffic", self.id);

        let outcome = loop {
            match self.handle_next().await {
                Ok(()) => continue,
                Err(e) if e.is_closed() => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.join_arrivals().await?;
        outcome?;

        let busy = self.pool().busy_count();
        if busy > 0 {
            warn!("Airport {} stopped with {} runways still held", self.id, busy);
        }
        self.report.runways = self.pool().snapshot();

        info!(
            "Airport {} stopped after {} departures and {} arrivals",
            self.id,
            self.report.departures.len(),
            self.report.arrivals.len()
        );
        Ok(self.report)
    }

    /// Take the next departure or arrival relay and act on it
    pub async fn handle_next(&mut self) -> Result<()> {
        let relays = Selector::any_of(&[ProtocolPhase::Departure, ProtocolPhase::Arrival]);
        let record = self.channel.recv_matching(&relays).await?;
        self.reap_arrivals()?;

        match record.phase {
            ProtocolPhase::Departure if record.departure == self.id => {
                let assignment = self.depart(&record).await?;
                self.report.departures.push(assignment);
                self.channel.send(&record, ProtocolPhase::DepartureCleared).await
            }
            ProtocolPhase::Arrival if record.arrival == self.id => {
                self.channel.send(&record, ProtocolPhase::ArrivalAccepted).await?;
                self.spawn_arrival(&record);
                Ok(())
            }
            _ => self.relay(&record).await,
        }
    }

    #[instrument(skip(self, record), fields(airport = self.id, plane = record.plane_id))]
    async fn depart(&self, record: &FlightRecord) -> Result<Assignment> {
        let engine = Arc::clone(&self.engine);
        let request = AllocationRequest {
            plane_id: record.plane_id,
            weight: record.weight,
            leg: Leg::Departure,
        };

        // Runs as its own task, joined before the departure is reported
        tokio::spawn(async move { engine.service(request).await })
            .await
            .map_err(|e| SimError::TaskFailed(format!("departure task: {}", e)))?
    }

    fn spawn_arrival(&mut self, record: &FlightRecord) {
        let engine = Arc::clone(&self.engine);
        let request = AllocationRequest {
            plane_id: record.plane_id,
            weight: record.weight,
            leg: Leg::Arrival,
        };
        debug!(airport = self.id, plane = record.plane_id, "Arrival accepted");
        self.arrivals.spawn(async move { engine.service(request).await });
    }

    async fn relay(&mut self, record: &FlightRecord) -> Result<()> {
        debug!(
            airport = self.id,
            plane = record.plane_id,
            phase = %record.phase,
            "Not ours, passing through"
        );
        self.channel.send(record, record.phase).await?;
        self.report.relayed += 1;
        // Give the airport the message belongs to a chance to take it
        tokio::time::sleep(RELAY_BACKOFF).await;
        Ok(())
    }

    /// Collect arrivals that already finished
    fn reap_arrivals(&mut self) -> Result<()> {
        while let Some(joined) = self.arrivals.try_join_next() {
            self.record_arrival(joined)?;
        }
        Ok(())
    }

    async fn join_arrivals(&mut self) -> Result<()> {
        while let Some(joined) = self.arrivals.join_next().await {
            self.record_arrival(joined)?;
        }
        Ok(())
    }

    fn record_arrival(
        &mut self,
        joined: std::result::Result<Result<Assignment>, tokio::task::JoinError>,
    ) -> Result<()> {
        match joined {
            Ok(Ok(assignment)) => {
                self.report.arrivals.push(assignment);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(e) => {
                warn!("Arrival task at airport {} failed: {}", self.id, e);
                Err(SimError::TaskFailed(format!("arrival task: {}", e)))
            }
        }
    }
}
