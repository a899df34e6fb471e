// packages/engine/src/protocol/codec.rs
//! Fixed-width record layout
//!
//! Eight little-endian `i32` fields in this order:
//!
//! ```text
//! tag | arrival | departure | plane | weight | category | passengers | flag
//! ```
//!
//! The tag travels out of band (as the message type) for every phase except
//! [`ProtocolPhase::Complete`], whose body carries all eight fields.

use crate::protocol::phase::ProtocolPhase;
use crate::protocol::record::{FlightRecord, PlaneCategory};
use crate::utils::errors::{Result, SimError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Body length without the tag
pub const PAYLOAD_LEN: usize = 7 * 4;

/// Body length with the tag
pub const FULL_LEN: usize = 8 * 4;

/// Which fields a phase puts on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireLayout {
    Payload,
    Full,
}

impl WireLayout {
    pub fn for_phase(phase: ProtocolPhase) -> Self {
        match phase {
            ProtocolPhase::Complete => WireLayout::Full,
            _ => WireLayout::Payload,
        }
    }

    pub fn body_len(&self) -> usize {
        match self {
            WireLayout::Payload => PAYLOAD_LEN,
            WireLayout::Full => FULL_LEN,
        }
    }
}

fn to_wire(field: &str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| SimError::Codec(format!("{} {} does not fit", field, value)))
}

fn from_wire(field: &str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| SimError::Codec(format!("negative {} {}", field, value)))
}

/// Encode the body of a message tagged `record.phase`
pub fn encode(record: &FlightRecord) -> Result<Bytes> {
    let layout = WireLayout::for_phase(record.phase);
    let mut buf = BytesMut::with_capacity(layout.body_len());

    if layout == WireLayout::Full {
        buf.put_i32_le(record.phase.code() as i32);
    }
    buf.put_i32_le(to_wire("arrival", record.arrival)?);
    buf.put_i32_le(to_wire("departure", record.departure)?);
    buf.put_i32_le(to_wire("plane id", record.plane_id)?);
    buf.put_i32_le(to_wire("weight", record.weight)?);
    buf.put_i32_le(record.category.code());
    buf.put_i32_le(to_wire("passenger count", record.passengers)?);
    buf.put_i32_le(to_wire("flag", record.flag)?);

    Ok(buf.freeze())
}

/// Decode a message body received under `phase`
pub fn decode(phase: ProtocolPhase, mut body: &[u8]) -> Result<FlightRecord> {
    let layout = WireLayout::for_phase(phase);
    if body.len() != layout.body_len() {
        return Err(SimError::Codec(format!(
            "{} body is {} bytes, expected {}",
            phase,
            body.len(),
            layout.body_len()
        )));
    }

    if layout == WireLayout::Full {
        let tag = body.get_i32_le() as i64;
        if tag != phase.code() {
            return Err(SimError::Codec(format!(
                "embedded tag {} does not match message type {}",
                tag,
                phase.code()
            )));
        }
    }

    let arrival = from_wire("arrival", body.get_i32_le())?;
    let departure = from_wire("departure", body.get_i32_le())?;
    let plane_id = from_wire("plane id", body.get_i32_le())?;
    let weight = from_wire("weight", body.get_i32_le())?;
    let category = PlaneCategory::from_code(body.get_i32_le());
    let passengers = from_wire("passenger count", body.get_i32_le())?;
    let flag = from_wire("flag", body.get_i32_le())?;

    Ok(FlightRecord {
        phase,
        plane_id,
        departure,
        arrival,
        weight,
        category,
        passengers,
        flag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(phase: ProtocolPhase) -> FlightRecord {
        FlightRecord {
            phase,
            plane_id: 17,
            departure: 2,
            arrival: 9,
            weight: 8000,
            category: PlaneCategory::Passenger,
            passengers: 6,
            flag: 0,
        }
    }

    #[test]
    fn test_payload_layout_field_order() {
        let body = encode(&sample(ProtocolPhase::Departure)).unwrap();
        assert_eq!(body.len(), PAYLOAD_LEN);
        // arrival comes first, departure second
        assert_eq!(&body[0..4], &9i32.to_le_bytes());
        assert_eq!(&body[4..8], &2i32.to_le_bytes());
        assert_eq!(&body[8..12], &17i32.to_le_bytes());
    }

    #[test]
    fn test_complete_carries_tag() {
        let record = sample(ProtocolPhase::Complete);
        let body = encode(&record).unwrap();
        assert_eq!(body.len(), FULL_LEN);
        assert_eq!(&body[0..4], &6i32.to_le_bytes());
        assert_eq!(decode(ProtocolPhase::Complete, &body).unwrap(), record);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let body = encode(&sample(ProtocolPhase::Request)).unwrap();
        let err = decode(ProtocolPhase::Complete, &body).unwrap_err();
        assert!(matches!(err, SimError::Codec(_)));
    }

    #[test]
    fn test_decode_rejects_mismatched_tag() {
        let mut body = encode(&sample(ProtocolPhase::Complete)).unwrap().to_vec();
        body[0..4].copy_from_slice(&5i32.to_le_bytes());
        assert!(decode(ProtocolPhase::Complete, &body).is_err());
    }

    #[test]
    fn test_decode_rejects_negative_weight() {
        let mut body = encode(&sample(ProtocolPhase::Arrival)).unwrap().to_vec();
        body[12..16].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(decode(ProtocolPhase::Arrival, &body).is_err());
    }
}
