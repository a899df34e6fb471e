// packages/engine/src/runway/pool.rs
//! Per-airport runway registry
//!
//! Regular runways occupy indices `0..N` (numbers `1..=N`); the backup runway
//! sits at index `N` (number `N + 1`) with a capacity above any legitimate
//! plane weight.
//!
//! Availability can be read without locking, but every change goes through
//! [`RunwayPool::set_available`], which holds the pool's commit lock and
//! re-checks the current state before writing.

use crate::utils::errors::{Result, SimError};
use crate::utils::validation::{MAX_RUNWAYS, MAX_RUNWAY_CAPACITY, MIN_RUNWAY_CAPACITY};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Capacity of the backup runway
pub const BACKUP_CAPACITY: u32 = 15000;

/// One physical runway
#[derive(Debug)]
pub struct Runway {
    number: u32,
    capacity: u32,
    backup: bool,
    /// Planes currently on the runway; regular runways hold at most one
    holders: AtomicUsize,
}

impl Runway {
    fn new(number: u32, capacity: u32, backup: bool) -> Self {
        Self {
            number,
            capacity,
            backup,
            holders: AtomicUsize::new(0),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_backup(&self) -> bool {
        self.backup
    }

    pub fn is_available(&self) -> bool {
        self.holders.load(Ordering::Acquire) == 0
    }
}

/// Point-in-time view of one runway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunwayStatus {
    pub number: u32,
    pub capacity: u32,
    pub backup: bool,
    pub available: bool,
}

/// Runways of one airport plus the lock and permits guarding them
pub struct RunwayPool {
    airport_id: u32,
    runways: Vec<Runway>,
    commit: Mutex<()>,
    permits: Arc<Semaphore>,
}

impl RunwayPool {
    /// Build `capacities.len()` regular runways plus the backup, all available
    pub fn new(airport_id: u32, capacities: &[u32]) -> Result<Self> {
        if capacities.is_empty() || capacities.len() > MAX_RUNWAYS {
            return Err(SimError::ResourceInitFailed(format!(
                "airport {} needs between 1 and {} runways, got {}",
                airport_id,
                MAX_RUNWAYS,
                capacities.len()
            )));
        }

        let mut runways = Vec::with_capacity(capacities.len() + 1);
        for (i, &capacity) in capacities.iter().enumerate() {
            if !(MIN_RUNWAY_CAPACITY..=MAX_RUNWAY_CAPACITY).contains(&capacity) {
                return Err(SimError::ResourceInitFailed(format!(
                    "runway {} capacity {} outside {}..={}",
                    i + 1,
                    capacity,
                    MIN_RUNWAY_CAPACITY,
                    MAX_RUNWAY_CAPACITY
                )));
            }
            runways.push(Runway::new(i as u32 + 1, capacity, false));
        }
        runways.push(Runway::new(
            capacities.len() as u32 + 1,
            BACKUP_CAPACITY,
            true,
        ));

        info!(
            "Airport {} initialised with {} runways plus backup",
            airport_id,
            capacities.len()
        );

        Ok(Self {
            airport_id,
            runways,
            commit: Mutex::new(()),
            permits: Arc::new(Semaphore::new(capacities.len())),
        })
    }

    pub fn airport_id(&self) -> u32 {
        self.airport_id
    }

    /// All runways, backup last
    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    pub fn regular(&self) -> &[Runway] {
        &self.runways[..self.backup_index()]
    }

    pub fn backup_index(&self) -> usize {
        self.runways.len() - 1
    }

    pub fn backup(&self) -> &Runway {
        &self.runways[self.backup_index()]
    }

    pub fn get(&self, index: usize) -> Option<&Runway> {
        self.runways.get(index)
    }

    /// Advisory capacity signal
    pub fn permits(&self) -> &Arc<Semaphore> {
        &self.permits
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// The single mutation point for runway availability
    ///
    /// Marking a runway busy succeeds only if it is free at the moment the
    /// lock is held; the backup runway always accepts. Marking it available
    /// succeeds only if something holds it. Returns whether the state changed.
    pub fn set_available(&self, index: usize, available: bool) -> bool {
        let Some(runway) = self.runways.get(index) else {
            return false;
        };

        let _guard = self.commit.lock();
        let holders = runway.holders.load(Ordering::Acquire);

        let changed = if available {
            if holders == 0 {
                false
            } else {
                runway.holders.store(holders - 1, Ordering::Release);
                true
            }
        } else if runway.backup || holders == 0 {
            runway.holders.store(holders + 1, Ordering::Release);
            true
        } else {
            false
        };

        debug!(
            airport = self.airport_id,
            runway = runway.number,
            available,
            changed,
            "Runway availability update"
        );
        changed
    }

    /// Runways currently in use
    pub fn busy_count(&self) -> usize {
        self.runways.iter().filter(|r| !r.is_available()).count()
    }

    pub fn snapshot(&self) -> Vec<RunwayStatus> {
        self.runways
            .iter()
            .map(|r| RunwayStatus {
                number: r.number,
                capacity: r.capacity,
                backup: r.backup,
                available: r.is_available(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_layout() {
        let pool = RunwayPool::new(3, &[5000, 9000]).unwrap();
        assert_eq!(pool.airport_id(), 3);
        assert_eq!(pool.runways().len(), 3);
        assert_eq!(pool.regular().len(), 2);
        assert_eq!(pool.backup_index(), 2);

        let backup = pool.backup();
        assert!(backup.is_backup());
        assert_eq!(backup.number(), 3);
        assert_eq!(backup.capacity(), BACKUP_CAPACITY);

        assert_eq!(pool.regular()[0].number(), 1);
        assert!(pool.runways().iter().all(Runway::is_available));
        assert_eq!(pool.available_permits(), 2);
    }

    #[test]
    fn test_exactly_one_backup() {
        let pool = RunwayPool::new(1, &[1000, 2000, 3000, 4000]).unwrap();
        assert_eq!(pool.runways().iter().filter(|r| r.is_backup()).count(), 1);
    }

    #[test]
    fn test_capacity_validation() {
        assert!(matches!(
            RunwayPool::new(1, &[999]),
            Err(SimError::ResourceInitFailed(_))
        ));
        assert!(matches!(
            RunwayPool::new(1, &[5000, 12001]),
            Err(SimError::ResourceInitFailed(_))
        ));
        assert!(RunwayPool::new(1, &[]).is_err());
        assert!(RunwayPool::new(1, &[5000; 11]).is_err());
        assert!(RunwayPool::new(1, &[1000, 12000]).is_ok());
    }

    #[test]
    fn test_regular_runway_alternates() {
        let pool = RunwayPool::new(1, &[5000, 6000]).unwrap();

        assert!(pool.set_available(0, false));
        assert!(!pool.get(0).unwrap().is_available());

        // Already busy: the re-check refuses a second claim
        assert!(!pool.set_available(0, false));

        assert!(pool.set_available(0, true));
        assert!(pool.get(0).unwrap().is_available());

        // Already free: nothing to release
        assert!(!pool.set_available(0, true));
    }

    #[test]
    fn test_backup_accepts_concurrent_holders() {
        let pool = RunwayPool::new(1, &[5000, 6000]).unwrap();
        let backup = pool.backup_index();

        assert!(pool.set_available(backup, false));
        assert!(pool.set_available(backup, false));
        assert_eq!(pool.busy_count(), 1);

        assert!(pool.set_available(backup, true));
        assert!(!pool.backup().is_available());
        assert!(pool.set_available(backup, true));
        assert!(pool.backup().is_available());
    }

    #[test]
    fn test_out_of_range_index() {
        let pool = RunwayPool::new(1, &[5000, 6000]).unwrap();
        assert!(!pool.set_available(10, false));
    }

    #[test]
    fn test_snapshot() {
        let pool = RunwayPool::new(1, &[5000, 6000]).unwrap();
        pool.set_available(1, false);

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot[0].available);
        assert!(!snapshot[1].available);
        assert!(snapshot[2].backup);
    }
}
