// packages/engine/src/runway/allocator.rs
//! Runway allocation engine
//!
//! # Algorithm
//!
//! 1. Scan the regular runways without locking; among available runways with
//!    capacity ≥ weight pick the one with the least slack (lowest index wins
//!    ties).
//! 2. Commit the pick through [`RunwayPool::set_available`], which re-checks
//!    availability under the pool lock. If another task claimed it since the
//!    scan, scan again.
//! 3. When no regular runway qualifies, take the backup runway.
//! 4. Hold the runway for the leg's service time, outside the lock.
//! 5. Release the runway and its permit.
//!
//! Departure and arrival tasks of one airport run this concurrently on the
//! same pool.

use crate::runway::pool::{Runway, RunwayPool};
use crate::runway::service::{Leg, ServiceTimes};
use crate::utils::errors::{Result, SimError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info, trace};

/// Context of one allocation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub plane_id: u32,
    pub weight: u32,
    pub leg: Leg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    BestFit,
    Backup,
}

impl AllocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationKind::BestFit => "best_fit",
            AllocationKind::Backup => "backup",
        }
    }
}

/// Which runway a plane got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub plane_id: u32,
    pub airport_id: u32,
    pub index: usize,
    pub runway_number: u32,
    pub capacity: u32,
    pub kind: AllocationKind,
    /// Commits that lost a race before this one succeeded
    pub conflicts: u32,
}

/// Best-fit index among available regular runways
pub fn best_fit(runways: &[Runway], weight: u32) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;

    for (index, runway) in runways.iter().enumerate() {
        if runway.is_backup() || !runway.is_available() || runway.capacity() < weight {
            continue;
        }
        let slack = runway.capacity() - weight;
        if best.map_or(true, |(_, min_slack)| slack < min_slack) {
            best = Some((index, slack));
        }
    }

    best.map(|(index, _)| index)
}

/// A claimed runway; released when dropped
pub struct RunwayLease {
    pool: Arc<RunwayPool>,
    assignment: Assignment,
    permit: Option<OwnedSemaphorePermit>,
    released: bool,
}

impl RunwayLease {
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Mark the runway available again and hand the permit back
    pub fn release(mut self) -> Assignment {
        self.release_inner();
        self.assignment
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.pool.set_available(self.assignment.index, true);
        // Dropping the permit returns it to the semaphore
        self.permit.take();
        trace!(
            airport = self.assignment.airport_id,
            runway = self.assignment.runway_number,
            "Runway released"
        );
    }
}

impl Drop for RunwayLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Allocation engine bound to one airport's pool
pub struct AllocationEngine {
    pool: Arc<RunwayPool>,
    service: ServiceTimes,
}

impl AllocationEngine {
    pub fn new(pool: Arc<RunwayPool>, service: ServiceTimes) -> Self {
        Self { pool, service }
    }

    pub fn pool(&self) -> &Arc<RunwayPool> {
        &self.pool
    }

    pub fn service_times(&self) -> &ServiceTimes {
        &self.service
    }

    /// Claim a runway for a plane of `weight`
    pub fn claim(&self, plane_id: u32, weight: u32) -> Result<RunwayLease> {
        let candidate = best_fit(self.pool.runways(), weight);
        self.claim_from(plane_id, weight, candidate)
    }

    /// Commit loop starting from a scan result that may already be stale
    pub(crate) fn claim_from(
        &self,
        plane_id: u32,
        weight: u32,
        mut candidate: Option<usize>,
    ) -> Result<RunwayLease> {
        let mut conflicts = 0;

        loop {
            match candidate {
                Some(index) => {
                    if self.pool.set_available(index, false) {
                        return Ok(self.lease(plane_id, index, AllocationKind::BestFit, conflicts));
                    }
                    conflicts += 1;
                    metrics::counter!("atc_claim_conflicts_total").increment(1);
                    debug!(
                        airport = self.pool.airport_id(),
                        plane = plane_id,
                        index,
                        "Runway claimed by another task, rescanning"
                    );
                    candidate = best_fit(self.pool.runways(), weight);
                }
                None => {
                    let backup = self.pool.backup();
                    if backup.capacity() < weight {
                        return Err(SimError::NoAvailableResource(format!(
                            "plane {} weighs {}, above backup capacity {}",
                            plane_id,
                            weight,
                            backup.capacity()
                        )));
                    }
                    let index = self.pool.backup_index();
                    self.pool.set_available(index, false);
                    return Ok(self.lease(plane_id, index, AllocationKind::Backup, conflicts));
                }
            }
        }
    }

    fn lease(&self, plane_id: u32, index: usize, kind: AllocationKind, conflicts: u32) -> RunwayLease {
        let runway = &self.pool.runways()[index];
        // Advisory only: exhaustion never blocks an allocation
        let permit = Arc::clone(self.pool.permits()).try_acquire_owned().ok();

        RunwayLease {
            pool: Arc::clone(&self.pool),
            assignment: Assignment {
                plane_id,
                airport_id: self.pool.airport_id(),
                index,
                runway_number: runway.number(),
                capacity: runway.capacity(),
                kind,
                conflicts,
            },
            permit,
            released: false,
        }
    }

    /// Claim, hold for the leg's service time, release
    pub async fn service(&self, request: AllocationRequest) -> Result<Assignment> {
        let lease = self.claim(request.plane_id, request.weight)?;
        let assigned = *lease.assignment();

        metrics::counter!(
            "atc_runway_allocations_total",
            "leg" => request.leg.as_str(),
            "kind" => assigned.kind.as_str()
        )
        .increment(1);

        debug!(
            airport = assigned.airport_id,
            plane = assigned.plane_id,
            runway = assigned.runway_number,
            hold = ?self.service.total(request.leg),
            "Holding runway"
        );
        self.service.simulate(request.leg).await;
        let assignment = lease.release();

        match request.leg {
            Leg::Departure => info!(
                "Plane {} has completed boarding/loading and taken off from Runway No. {} of Airport No. {}",
                assignment.plane_id, assignment.runway_number, assignment.airport_id
            ),
            Leg::Arrival => info!(
                "Plane {} has landed on Runway No. {} of Airport No. {} and has completed deboarding/unloading",
                assignment.plane_id, assignment.runway_number, assignment.airport_id
            ),
        }

        Ok(assignment)
    }
}
