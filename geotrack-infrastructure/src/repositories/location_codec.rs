//! Fixed binary record for `LastKnownLocation`.
//!
//! Layout (little-endian, 25 bytes):
//! `version: u8 | latitude: f64 | longitude: f64 | observed_at_millis: i64`

use geotrack_domain::{millis_to_utc, Coordinates, LastKnownLocation, StoreError};

pub const RECORD_VERSION: u8 = 1;
pub const RECORD_LEN: usize = 1 + 8 + 8 + 8;

pub fn encode(location: &LastKnownLocation) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECORD_LEN);
    out.push(RECORD_VERSION);
    out.extend_from_slice(&location.latitude.to_le_bytes());
    out.extend_from_slice(&location.longitude.to_le_bytes());
    out.extend_from_slice(&location.observed_at.timestamp_millis().to_le_bytes());
    out
}

pub fn decode(bytes: &[u8]) -> Result<LastKnownLocation, StoreError> {
    if bytes.len() != RECORD_LEN {
        return Err(StoreError::Malformed(format!(
            "location record has {} bytes, expected {}",
            bytes.len(),
            RECORD_LEN
        )));
    }
    if bytes[0] != RECORD_VERSION {
        return Err(StoreError::Malformed(format!(
            "unsupported location record version {}",
            bytes[0]
        )));
    }

    let latitude = f64::from_le_bytes(field(bytes, 1));
    let longitude = f64::from_le_bytes(field(bytes, 9));
    let observed_at_ms = i64::from_le_bytes(field(bytes, 17));

    Coordinates::new(latitude, longitude)
        .validate()
        .map_err(|err| StoreError::Malformed(err.to_string()))?;
    let observed_at = millis_to_utc(observed_at_ms).ok_or_else(|| {
        StoreError::Malformed(format!("observed_at out of range: {}", observed_at_ms))
    })?;

    Ok(LastKnownLocation {
        latitude,
        longitude,
        observed_at,
    })
}

fn field(bytes: &[u8], offset: usize) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    buf
}
