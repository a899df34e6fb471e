// packages/engine/src/protocol/aircraft.rs
//! Aircraft actor: submit a request, wait for this plane's completion

use crate::channel::{ChannelHandle, Selector};
use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::utils::errors::Result;
use crate::utils::validation::validate_plane_id;
use serde::Serialize;
use tracing::{info, warn};

/// How a journey ended from the plane's point of view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum JourneyOutcome {
    Completed(FlightRecord),
    /// The controller shut down before running the journey
    Aborted(FlightRecord),
}

impl JourneyOutcome {
    pub fn record(&self) -> &FlightRecord {
        match self {
            JourneyOutcome::Completed(record) | JourneyOutcome::Aborted(record) => record,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JourneyOutcome::Completed(_))
    }
}

/// Fly one journey
///
/// Sends `record` as a phase 1 request and blocks until the phase 6 record
/// for the same plane ID comes back. Completions for other planes are left
/// on the channel for their owners. Plane ID zero belongs to control records
/// and is refused before anything is sent.
pub async fn fly(channel: &ChannelHandle, record: &FlightRecord) -> Result<JourneyOutcome> {
    validate_plane_id(record.plane_id)?;
    channel.send(record, ProtocolPhase::Request).await?;
    info!(
        "Plane {} requested departure from Airport {} to Airport {}",
        record.plane_id, record.departure, record.arrival
    );

    let selector = Selector::phase(ProtocolPhase::Complete).for_plane(record.plane_id);
    let complete = channel.recv_matching(&selector).await?;

    if complete.is_aborted() {
        warn!("Plane {} journey aborted by controller shutdown", complete.plane_id);
        return Ok(JourneyOutcome::Aborted(complete));
    }

    info!(
        "Plane {} has successfully travelled from Airport {} to Airport {}!",
        complete.plane_id, complete.departure, complete.arrival
    );
    Ok(JourneyOutcome::Completed(complete))
}
