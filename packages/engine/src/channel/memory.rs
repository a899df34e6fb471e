// packages/engine/src/channel/memory.rs
//! In-process mailbox
//!
//! A single ordered queue guarded by a mutex; blocked receivers park on a
//! [`Notify`] and rescan after every send. After teardown, messages that were
//! already queued can still be taken; once none match, receivers get
//! [`SimError::ChannelClosed`].

use crate::channel::{record_sent, ReceiveMode, Selector, SharedChannel};
use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::utils::errors::{Result, SimError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<FlightRecord>,
    closed: bool,
    sent: u64,
    received: u64,
}

impl ChannelState {
    fn take(&mut self, selector: &Selector) -> Option<FlightRecord> {
        let position = self.queue.iter().position(|record| selector.matches(record))?;
        self.received += 1;
        self.queue.remove(position)
    }
}

/// Channel statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub sent: u64,
    pub received: u64,
    pub pending: usize,
    pub closed: bool,
}

/// In-process shared channel
pub struct MemoryChannel {
    name: String,
    state: Mutex<ChannelState>,
    notify: Notify,
}

impl MemoryChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ChannelState::default()),
            notify: Notify::new(),
        }
    }

    /// Number of queued messages tagged `phase`
    pub fn pending(&self, phase: ProtocolPhase) -> usize {
        self.state
            .lock()
            .queue
            .iter()
            .filter(|record| record.phase == phase)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn stats(&self) -> ChannelStats {
        let state = self.state.lock();
        ChannelStats {
            sent: state.sent,
            received: state.received,
            pending: state.queue.len(),
            closed: state.closed,
        }
    }
}

#[async_trait]
impl SharedChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: &FlightRecord, phase: ProtocolPhase) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SimError::ChannelClosed);
            }
            state.queue.push_back(record.tagged(phase));
            state.sent += 1;
        }

        debug!(channel = %self.name, plane = record.plane_id, %phase, "Message sent");
        record_sent(phase);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn receive(
        &self,
        selector: &Selector,
        mode: ReceiveMode,
    ) -> Result<Option<FlightRecord>> {
        loop {
            // Register interest before scanning so a send between the scan
            // and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(record) = state.take(selector) {
                    trace!(channel = %self.name, plane = record.plane_id, phase = %record.phase, "Message received");
                    return Ok(Some(record));
                }
                if state.closed {
                    return Err(SimError::ChannelClosed);
                }
            }

            if mode == ReceiveMode::NonBlocking {
                return Ok(None);
            }

            notified.await;
        }
    }

    async fn teardown(&self) -> Result<()> {
        self.state.lock().closed = true;
        debug!(channel = %self.name, "Channel torn down");
        self.notify.notify_waiters();
        Ok(())
    }
}
