// packages/engine/src/channel/sysv.rs
//! System V message-queue channel
//!
//! Lets the controller, airports and aircraft run as separate processes. The
//! queue key is derived with `ftok` from a shared key file and project byte;
//! the message type is the phase code and the body uses the fixed-width
//! record layout from [`crate::protocol::codec`].
//!
//! The kernel filters by message type only. Multi-phase selectors poll each
//! phase without waiting, and plane filters put non-matching records back
//! at the tail of the queue.

use crate::channel::{record_sent, ReceiveMode, Selector, SharedChannel};
use crate::protocol::codec::{self, FULL_LEN};
use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::FlightRecord;
use crate::utils::config::ChannelConfig;
use crate::utils::errors::{Result, SimError};
use async_trait::async_trait;
use std::ffi::CString;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, trace};

const QUEUE_PERMISSIONS: libc::c_int = 0o666;

/// Poll interval used when the kernel cannot block on the selector directly
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[repr(C)]
struct RawMessage {
    mtype: libc::c_long,
    body: [u8; FULL_LEN],
}

/// Channel backed by a System V message queue
pub struct SysvChannel {
    name: String,
    key: libc::key_t,
    queue_id: libc::c_int,
}

impl SysvChannel {
    /// Create (or open) the queue; used by the controller
    pub fn create(config: &ChannelConfig) -> Result<Self> {
        // ftok needs the key file to exist
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.key_path)
            .map_err(|e| {
                SimError::ChannelUnavailable(format!(
                    "cannot create key file {:?}: {}",
                    config.key_path, e
                ))
            })?;

        Self::open(config, libc::IPC_CREAT | QUEUE_PERMISSIONS)
    }

    /// Attach to a queue the controller already created
    pub fn attach(config: &ChannelConfig) -> Result<Self> {
        Self::open(config, QUEUE_PERMISSIONS)
    }

    fn open(config: &ChannelConfig, flags: libc::c_int) -> Result<Self> {
        let key = resolve_key(&config.key_path, config.project_id)?;

        // SAFETY: msgget takes no pointers
        let queue_id = unsafe { libc::msgget(key, flags) };
        if queue_id == -1 {
            return Err(SimError::ChannelUnavailable(format!(
                "msgget for key {:#x} failed: {}",
                key,
                io::Error::last_os_error()
            )));
        }

        info!(
            "Attached to channel '{}' (key {:#x}, queue {})",
            config.name, key, queue_id
        );

        Ok(Self {
            name: config.name.clone(),
            key,
            queue_id,
        })
    }

    pub fn key(&self) -> libc::key_t {
        self.key
    }

    async fn take(&self, phase: ProtocolPhase, wait: bool) -> Result<Option<FlightRecord>> {
        let queue_id = self.queue_id;
        let received = tokio::task::spawn_blocking(move || raw_receive(queue_id, phase, wait))
            .await
            .map_err(|e| SimError::ReceiveFailed(format!("receive task failed: {}", e)))??;

        match received {
            Some(body) => Ok(Some(codec::decode(phase, &body)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &FlightRecord) -> Result<()> {
        let body = codec::encode(record)?;
        let queue_id = self.queue_id;
        let mtype = record.phase.code() as libc::c_long;

        tokio::task::spawn_blocking(move || raw_send(queue_id, mtype, &body))
            .await
            .map_err(|e| SimError::SendFailed(format!("send task failed: {}", e)))?
    }

    /// One pass over the selector's phases without waiting
    async fn poll_once(&self, selector: &Selector) -> Result<Option<FlightRecord>> {
        for &phase in selector.phases() {
            if let Some(record) = self.take(phase, false).await? {
                if selector.matches(&record) {
                    return Ok(Some(record));
                }
                trace!(plane = record.plane_id, %phase, "Requeueing record for another plane");
                self.put(&record).await?;
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl SharedChannel for SysvChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, record: &FlightRecord, phase: ProtocolPhase) -> Result<()> {
        self.put(&record.tagged(phase)).await?;
        debug!(channel = %self.name, plane = record.plane_id, %phase, "Message sent");
        record_sent(phase);
        Ok(())
    }

    async fn receive(
        &self,
        selector: &Selector,
        mode: ReceiveMode,
    ) -> Result<Option<FlightRecord>> {
        // A single phase with no plane filter can block in the kernel
        if mode == ReceiveMode::Blocking
            && selector.phases().len() == 1
            && selector.plane_id().is_none()
        {
            return self.take(selector.phases()[0], true).await;
        }

        loop {
            if let Some(record) = self.poll_once(selector).await? {
                return Ok(Some(record));
            }
            if mode == ReceiveMode::NonBlocking {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn teardown(&self) -> Result<()> {
        // SAFETY: IPC_RMID ignores the buffer argument
        let rc = unsafe { libc::msgctl(self.queue_id, libc::IPC_RMID, std::ptr::null_mut()) };
        if rc == -1 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::EIDRM) | Some(libc::EINVAL) => SimError::ChannelClosed,
                _ => SimError::ChannelUnavailable(format!("msgctl(IPC_RMID) failed: {}", err)),
            });
        }
        info!("Channel '{}' removed", self.name);
        Ok(())
    }
}

/// Resolve the well-known key file to an IPC key
pub fn resolve_key(path: &Path, project_id: u8) -> Result<libc::key_t> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        SimError::ChannelUnavailable(format!("key path {:?} contains a NUL byte", path))
    })?;

    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    let key = unsafe { libc::ftok(c_path.as_ptr(), project_id as libc::c_int) };
    if key == -1 {
        return Err(SimError::ChannelUnavailable(format!(
            "ftok({:?}) failed: {}",
            path,
            io::Error::last_os_error()
        )));
    }
    Ok(key)
}

fn raw_send(queue_id: libc::c_int, mtype: libc::c_long, body: &[u8]) -> Result<()> {
    let mut message = RawMessage {
        mtype,
        body: [0; FULL_LEN],
    };
    message.body[..body.len()].copy_from_slice(body);

    loop {
        // SAFETY: message is a live repr(C) struct whose body holds body.len() bytes
        let rc = unsafe {
            libc::msgsnd(
                queue_id,
                &message as *const RawMessage as *const libc::c_void,
                body.len(),
                0,
            )
        };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::EIDRM) | Some(libc::EINVAL) => return Err(SimError::ChannelClosed),
            _ => return Err(SimError::SendFailed(err.to_string())),
        }
    }
}

fn raw_receive(
    queue_id: libc::c_int,
    phase: ProtocolPhase,
    wait: bool,
) -> Result<Option<Vec<u8>>> {
    let mut message = RawMessage {
        mtype: 0,
        body: [0; FULL_LEN],
    };
    let flags = if wait { 0 } else { libc::IPC_NOWAIT };

    loop {
        // SAFETY: message is writable for FULL_LEN body bytes
        let n = unsafe {
            libc::msgrcv(
                queue_id,
                &mut message as *mut RawMessage as *mut libc::c_void,
                FULL_LEN,
                phase.code() as libc::c_long,
                flags,
            )
        };
        if n >= 0 {
            return Ok(Some(message.body[..n as usize].to_vec()));
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::ENOMSG) => return Ok(None),
            Some(libc::EIDRM) | Some(libc::EINVAL) => return Err(SimError::ChannelClosed),
            _ => return Err(SimError::ReceiveFailed(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir, project_id: u8) -> ChannelConfig {
        ChannelConfig {
            name: "sysv-test".to_string(),
            key_path: dir.path().join("channel.key"),
            project_id,
        }
    }

    fn record(plane_id: u32) -> FlightRecord {
        FlightRecord {
            plane_id,
            departure: 1,
            arrival: 2,
            weight: 4200,
            ..FlightRecord::control(ProtocolPhase::Request)
        }
    }

    #[test]
    fn test_attach_without_key_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SysvChannel::attach(&config(&dir, b'A'));
        assert!(matches!(result, Err(SimError::ChannelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_send_receive_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, b'B');
        let channel = SysvChannel::create(&config).unwrap();
        let peer = SysvChannel::attach(&config).unwrap();
        assert_eq!(channel.key(), peer.key());

        channel.send(&record(3), ProtocolPhase::Departure).await.unwrap();
        channel.send(&record(4), ProtocolPhase::Complete).await.unwrap();

        assert!(peer.try_recv(ProtocolPhase::Arrival).await.unwrap().is_none());

        let departure = peer.recv(ProtocolPhase::Departure).await.unwrap();
        assert_eq!(departure.plane_id, 3);
        assert_eq!(departure.weight, 4200);

        let selector = Selector::phase(ProtocolPhase::Complete).for_plane(4);
        let complete = peer.recv_matching(&selector).await.unwrap();
        assert_eq!(complete.phase, ProtocolPhase::Complete);

        channel.teardown().await.unwrap();
        assert!(matches!(
            peer.try_recv(ProtocolPhase::Departure).await,
            Err(SimError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_poll_any_of_and_requeue_other_planes() {
        let dir = tempfile::tempdir().unwrap();
        let channel = SysvChannel::create(&config(&dir, b'C')).unwrap();

        channel.send(&record(1), ProtocolPhase::Complete).await.unwrap();
        channel.send(&record(2), ProtocolPhase::Complete).await.unwrap();
        channel.send(&record(3), ProtocolPhase::Arrival).await.unwrap();

        let relays = Selector::any_of(&[ProtocolPhase::Departure, ProtocolPhase::Arrival]);
        let arrival = channel
            .receive(&relays, ReceiveMode::Blocking)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(arrival.phase, ProtocolPhase::Arrival);
        assert_eq!(arrival.plane_id, 3);

        // Plane 1's completion is ahead and has to go back on the queue
        let second = Selector::phase(ProtocolPhase::Complete).for_plane(2);
        assert_eq!(channel.recv_matching(&second).await.unwrap().plane_id, 2);

        let first = Selector::phase(ProtocolPhase::Complete).for_plane(1);
        let requeued = channel.recv_matching(&first).await.unwrap();
        assert_eq!(requeued, record(1).tagged(ProtocolPhase::Complete));

        assert!(channel.try_recv(ProtocolPhase::Complete).await.unwrap().is_none());
        channel.teardown().await.unwrap();
    }
}
