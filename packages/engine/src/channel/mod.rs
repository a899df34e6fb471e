// packages/engine/src/channel/mod.rs
//! Shared channel between actors
//!
//! A typed mailbox: every message is a [`FlightRecord`] tagged with a
//! [`ProtocolPhase`]. Receivers select messages by phase (and optionally by
//! plane), oldest first, so delivery is FIFO per tag.
//!
//! - **Memory**: in-process mailbox, one instance per simulation
//! - **Registry**: name → in-process mailbox mapping
//! - **SysV**: System V message queue shared by separate processes (Linux)
//!
//! # Handshake
//!
//! ```text
//! Aircraft ──1──▶ Controller ──2──▶ Departure airport
//!                     ▲  ◀──────3──────────┘
//!                     ├──4──▶ Arrival airport
//!                     ◀──────5──────┘
//! Aircraft ◀──6───────┘
//! ```

pub mod memory;
pub mod registry;
#[cfg(target_os = "linux")]
pub mod sysv;

pub use memory::{ChannelStats, MemoryChannel};
pub use registry::ChannelRegistry;
#[cfg(target_os = "linux")]
pub use sysv::SysvChannel;

use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::utils::errors::{Result, SimError};
use async_trait::async_trait;
use std::sync::Arc;

/// Handle injected into every actor
pub type ChannelHandle = Arc<dyn SharedChannel>;

/// Whether a receive may suspend the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    Blocking,
    NonBlocking,
}

/// Receive filter: a set of phases and an optional plane ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    phases: Vec<ProtocolPhase>,
    plane_id: Option<u32>,
}

impl Selector {
    pub fn phase(phase: ProtocolPhase) -> Self {
        Self {
            phases: vec![phase],
            plane_id: None,
        }
    }

    /// Matches the oldest message tagged with any of `phases`
    pub fn any_of(phases: &[ProtocolPhase]) -> Self {
        Self {
            phases: phases.to_vec(),
            plane_id: None,
        }
    }

    /// Restrict to one journey
    pub fn for_plane(mut self, plane_id: u32) -> Self {
        self.plane_id = Some(plane_id);
        self
    }

    pub fn phases(&self) -> &[ProtocolPhase] {
        &self.phases
    }

    pub fn plane_id(&self) -> Option<u32> {
        self.plane_id
    }

    pub fn matches(&self, record: &FlightRecord) -> bool {
        self.phases.contains(&record.phase)
            && self.plane_id.map_or(true, |id| id == record.plane_id)
    }
}

/// Typed mailbox shared by every actor of one simulation
#[async_trait]
pub trait SharedChannel: Send + Sync {
    /// Well-known name the channel was resolved from
    fn name(&self) -> &str;

    /// Enqueue a copy of `record` tagged with `phase`
    async fn send(&self, record: &FlightRecord, phase: ProtocolPhase) -> Result<()>;

    /// Remove the oldest message matching `selector`
    ///
    /// Non-blocking receives return `Ok(None)` when nothing matches.
    async fn receive(&self, selector: &Selector, mode: ReceiveMode)
        -> Result<Option<FlightRecord>>;

    /// Destroy the mailbox; receivers then observe [`SimError::ChannelClosed`]
    async fn teardown(&self) -> Result<()>;

    /// Block until a message tagged `phase` arrives
    async fn recv(&self, phase: ProtocolPhase) -> Result<FlightRecord> {
        self.recv_matching(&Selector::phase(phase)).await
    }

    /// Block until a message matching `selector` arrives
    async fn recv_matching(&self, selector: &Selector) -> Result<FlightRecord> {
        self.receive(selector, ReceiveMode::Blocking)
            .await?
            .ok_or_else(|| SimError::ReceiveFailed("blocking receive returned nothing".into()))
    }

    /// Take a message tagged `phase` if one is queued
    async fn try_recv(&self, phase: ProtocolPhase) -> Result<Option<FlightRecord>> {
        self.receive(&Selector::phase(phase), ReceiveMode::NonBlocking)
            .await
    }
}

pub(crate) fn record_sent(phase: ProtocolPhase) {
    metrics::counter!("atc_messages_sent_total", "phase" => phase.as_str()).increment(1);
}
