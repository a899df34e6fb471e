// packages/engine/src/protocol/controller.rs
//! Controller actor
//!
//! Sequences one journey at a time:
//!
//! ```text
//! wait 1|999 ─▶ drain 999 ─▶ send 2 ─▶ wait 3 ─▶ log ─▶ send 4 ─▶ wait 5 ─▶ send 6
//!     ▲                                                                    │
//!     └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On shutdown it answers every request it did not run with an aborted
//! completion, sends a final completion and tears the channel down.

use crate::channel::{ChannelHandle, Selector};
use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::recording::flight_log::FlightLog;
use crate::utils::errors::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Phases one journey went through, as seen by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyTrace {
    pub plane_id: u32,
    pub phases: Vec<ProtocolPhase>,
    pub completed_at: DateTime<Utc>,
}

/// What the controller did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerReport {
    pub journeys: Vec<JourneyTrace>,
    /// Plane IDs whose requests were answered with an aborted completion
    pub aborted: Vec<u32>,
}

/// Controller options
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Pause between the final completion and teardown, giving other
    /// processes time to pick up their last message
    pub teardown_grace: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            teardown_grace: Duration::ZERO,
        }
    }
}

pub struct Controller {
    channel: ChannelHandle,
    flight_log: FlightLog,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(channel: ChannelHandle, flight_log: FlightLog) -> Self {
        Self::with_config(channel, flight_log, ControllerConfig::default())
    }

    pub fn with_config(channel: ChannelHandle, flight_log: FlightLog, config: ControllerConfig) -> Self {
        Self {
            channel,
            flight_log,
            config,
        }
    }

    /// Run until a shutdown signal is observed
    pub async fn run(self) -> Result<ControllerReport> {
        info!("Controller listening on channel '{}'", self.channel.name());

        let mut report = ControllerReport::default();
        let wake = Selector::any_of(&[ProtocolPhase::Request, ProtocolPhase::Shutdown]);

        let (held, signal) = loop {
            let record = self.channel.recv_matching(&wake).await?;
            if record.phase == ProtocolPhase::Shutdown {
                break (None, record);
            }

            if let Some(signal) = self.channel.try_recv(ProtocolPhase::Shutdown).await? {
                break (Some(record), signal);
            }

            let trace = self.run_journey(record).await?;
            report.journeys.push(trace);
        };

        info!("Shutdown signal received");
        report.aborted = self.shutdown(held, signal).await?;
        Ok(report)
    }

    #[instrument(skip(self, request), fields(plane = request.plane_id))]
    async fn run_journey(&self, request: FlightRecord) -> Result<JourneyTrace> {
        let plane_id = request.plane_id;
        let mut phases = vec![request.phase];
        info!(
            "Plane {} requests departure from airport {} to airport {}",
            plane_id, request.departure, request.arrival
        );

        self.channel.send(&request, ProtocolPhase::Departure).await?;
        phases.push(ProtocolPhase::Departure);

        let cleared = self.channel.recv(ProtocolPhase::DepartureCleared).await?;
        phases.push(cleared.phase);
        self.flight_log.record_departure(&cleared).await;

        self.channel.send(&cleared, ProtocolPhase::Arrival).await?;
        phases.push(ProtocolPhase::Arrival);
        debug!("Arrival relayed to airport {}", cleared.arrival);

        let accepted = self.channel.recv(ProtocolPhase::ArrivalAccepted).await?;
        phases.push(accepted.phase);

        self.channel.send(&accepted, ProtocolPhase::Complete).await?;
        phases.push(ProtocolPhase::Complete);

        metrics::counter!("atc_journeys_completed_total").increment(1);
        info!("Plane {} journey complete", plane_id);

        Ok(JourneyTrace {
            plane_id,
            phases,
            completed_at: Utc::now(),
        })
    }

    async fn shutdown(&self, held: Option<FlightRecord>, signal: FlightRecord) -> Result<Vec<u32>> {
        let mut aborted = Vec::new();
        let mut pending: Vec<FlightRecord> = held.into_iter().collect();

        while let Some(request) = self.channel.try_recv(ProtocolPhase::Request).await? {
            pending.push(request);
        }

        for mut request in pending {
            debug!("Aborting queued request from plane {}", request.plane_id);
            request.mark_aborted();
            self.channel.send(&request, ProtocolPhase::Complete).await?;
            aborted.push(request.plane_id);
        }

        let mut last = signal;
        last.mark_aborted();
        self.channel.send(&last, ProtocolPhase::Complete).await?;

        if !self.config.teardown_grace.is_zero() {
            tokio::time::sleep(self.config.teardown_grace).await;
        }
        self.channel.teardown().await?;

        info!(
            "Controller stopped ({} queued requests aborted)",
            aborted.len()
        );
        Ok(aborted)
    }
}

/// Ask a running controller to stop
pub async fn request_shutdown(channel: &ChannelHandle) -> Result<()> {
    let signal = FlightRecord::control(ProtocolPhase::Shutdown);
    channel.send(&signal, ProtocolPhase::Shutdown).await?;
    info!("Shutdown signal sent on channel '{}'", channel.name());
    Ok(())
}
