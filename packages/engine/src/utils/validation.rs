// packages/engine/src/utils/validation.rs
//! Operator input bounds
//!
//! Checked before any channel is created or attached.

use crate::utils::errors::{Result, SimError};

pub const MAX_AIRPORTS: u32 = 10;
pub const MAX_RUNWAYS: usize = 10;
pub const MIN_RUNWAY_CAPACITY: u32 = 1000;
pub const MAX_RUNWAY_CAPACITY: u32 = 12000;

/// Airport IDs are 1..=MAX_AIRPORTS
pub fn validate_airport_id(id: u32) -> Result<()> {
    if id < 1 || id > MAX_AIRPORTS {
        return Err(SimError::ValidationFailed(format!(
            "Airport number must be between 1 and {}, got {}",
            MAX_AIRPORTS, id
        )));
    }
    Ok(())
}

/// Runway count must be even and within 1..=MAX_RUNWAYS
pub fn validate_runway_count(count: usize) -> Result<()> {
    if count % 2 != 0 {
        return Err(SimError::ValidationFailed(format!(
            "Number of runways must be an even number, got {}",
            count
        )));
    }
    if count < 1 || count > MAX_RUNWAYS {
        return Err(SimError::ValidationFailed(format!(
            "Number of runways must be between 1 and {}, got {}",
            MAX_RUNWAYS, count
        )));
    }
    Ok(())
}

/// Plane ID zero is reserved for control records
pub fn validate_plane_id(id: u32) -> Result<()> {
    if id == 0 {
        return Err(SimError::ValidationFailed(
            "Plane ID must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Departure and arrival must be valid and distinct
pub fn validate_route(departure: u32, arrival: u32) -> Result<()> {
    validate_airport_id(departure)?;
    validate_airport_id(arrival)?;
    if departure == arrival {
        return Err(SimError::ValidationFailed(format!(
            "Departure and arrival airport must differ, both are {}",
            departure
        )));
    }
    Ok(())
}

/// Inclusive range check shared by the payload inputs
pub fn validate_range(what: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(SimError::ValidationFailed(format!(
            "{} must be between {} and {}, got {}",
            what, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airport_id_bounds() {
        assert!(validate_airport_id(1).is_ok());
        assert!(validate_airport_id(10).is_ok());
        assert!(validate_airport_id(0).is_err());
        assert!(validate_airport_id(11).is_err());
    }

    #[test]
    fn test_plane_id() {
        assert!(validate_plane_id(1).is_ok());
        assert!(validate_plane_id(u32::MAX).is_ok());
        assert!(validate_plane_id(0).is_err());
    }

    #[test]
    fn test_runway_count() {
        assert!(validate_runway_count(2).is_ok());
        assert!(validate_runway_count(10).is_ok());
        assert!(validate_runway_count(0).is_err());
        assert!(validate_runway_count(12).is_err());

        let err = validate_runway_count(3).unwrap_err();
        assert!(matches!(err, SimError::ValidationFailed(ref msg) if msg.contains("even")));
    }

    #[test]
    fn test_route() {
        assert!(validate_route(1, 2).is_ok());
        assert!(validate_route(3, 3).is_err());
        assert!(validate_route(0, 2).is_err());
    }

    #[test]
    fn test_range() {
        assert!(validate_range("Luggage weight", 25, 0, 25).is_ok());
        assert!(validate_range("Luggage weight", 26, 0, 25).is_err());
    }
}
