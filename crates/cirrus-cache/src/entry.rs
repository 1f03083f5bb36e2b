//! Stored value layout: 8-byte big-endian expiry (ms since epoch) + payload.

use chrono::{DateTime, Utc};

use crate::error::CacheError;

const EXPIRY_LEN: usize = 8;

pub(crate) fn encode_entry(expires_at: DateTime<Utc>, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(EXPIRY_LEN + payload.len());
    bytes.extend_from_slice(&expires_at.timestamp_millis().to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Split a stored value into (expires_at_ms, payload).
pub(crate) fn decode_entry(bytes: &[u8]) -> Result<(i64, &[u8]), CacheError> {
    if bytes.len() < EXPIRY_LEN {
        return Err(CacheError::Corrupt(format!(
            "entry too short: {} bytes",
            bytes.len()
        )));
    }
    let (expiry, payload) = bytes.split_at(EXPIRY_LEN);
    let mut raw = [0u8; EXPIRY_LEN];
    raw.copy_from_slice(expiry);
    Ok((i64::from_be_bytes(raw), payload))
}

pub(crate) fn is_expired(expires_at_ms: i64, now: DateTime<Utc>) -> bool {
    now.timestamp_millis() >= expires_at_ms
}
