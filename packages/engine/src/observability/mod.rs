// packages/engine/src/observability/mod.rs
//! Logging and metrics setup
//!
//! Logs go to stderr so stdout stays free for reports. The filter comes from
//! `RUST_LOG` and defaults to `info`.
//!
//! Metrics emitted by the crate:
//!
//! - `atc_messages_sent_total{phase}`
//! - `atc_runway_allocations_total{leg, kind}`
//! - `atc_claim_conflicts_total`
//! - `atc_journeys_completed_total`

use crate::utils::errors::{Result, SimError};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Calling this twice is harmless; the second subscriber is discarded.
pub fn init_tracing(json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}

/// Install the Prometheus recorder when enabled
///
/// The returned handle renders the current metrics in text format.
pub fn init_metrics(enabled: bool) -> Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SimError::ConfigError(format!("metrics recorder: {}", e)))?;

    Ok(Some(handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        assert!(init_tracing(false).is_ok());
        assert!(init_tracing(true).is_ok());
    }

    #[test]
    fn test_metrics_disabled() {
        assert!(init_metrics(false).unwrap().is_none());
    }
}
