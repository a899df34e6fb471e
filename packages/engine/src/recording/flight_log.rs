// packages/engine/src/recording/flight_log.rs
//! Append-only flight log
//!
//! The controller writes one human-readable line per departure. Failing to
//! open or write the file is reported and otherwise ignored.

use crate::protocol::record::FlightRecord;
use crate::utils::errors::{Result, SimError};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Departure notice sink
#[derive(Debug, Clone)]
pub struct FlightLog {
    path: Option<PathBuf>,
}

impl FlightLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Sink that drops every line
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one line
    pub async fn append(&self, line: &str) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| SimError::Io(std::io::Error::new(e.kind(), format!("open {:?}: {}", path, e))))?;

        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;

        debug!("Appended to flight log {:?}", path);
        Ok(())
    }

    /// Log a departure; sink failures never reach the protocol
    pub async fn record_departure(&self, record: &FlightRecord) {
        if let Err(e) = self.append(&record.departure_notice()).await {
            warn!("Failed to write flight log: {}", e);
        }
    }
}
