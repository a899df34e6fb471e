// packages/engine/src/runway/mod.rs
//! Runway resources and allocation
//!
//! - **Pool**: the runways of one airport, including the backup runway
//! - **Allocator**: best-fit selection with re-validated commits
//! - **Service**: injectable boarding/landing/deboarding durations
//!
//! # Architecture
//!
//! ```text
//!  departure task ─┐                       ┌─ runway 1 (cap 8000)
//!                  ├─ scan ─▶ commit(lock) ├─ runway 2 (cap 9500)
//!  arrival task  ──┘    ▲        │         └─ backup   (cap 15000)
//!                       └─retry──┘
//! ```

pub mod allocator;
pub mod pool;
pub mod service;

pub use allocator::{AllocationEngine, AllocationKind, AllocationRequest, Assignment, RunwayLease};
pub use pool::{Runway, RunwayPool, RunwayStatus, BACKUP_CAPACITY};
pub use service::{Leg, ServiceTimes};
