//! Entry codec: tagged binary format with a fixed-size header.
//!
//! The header carries everything the pruner needs, so a sweep can decide an
//! entry's fate from 16 bytes without touching the payload.
//!
//! # Binary Format
//!
//! ```text
//! offset  size  field
//! 0       2     magic "HD"
//! 2       1     format version (currently 1)
//! 3       1     expiry flag (0 = never expires, 1 = expires at)
//! 4       8     expiry as unix milliseconds, i64 little-endian (0 if flag = 0)
//! 12      4     key length in bytes, u32 little-endian
//! 16      k     key (UTF-8)
//! 16+k    n     payload (opaque)
//! ```
//!
//! The flag byte keeps "never expires" distinguishable from any concrete
//! timestamp, including expiry exactly at the epoch.

use chrono::TimeZone;
use chrono::Utc;
use hoard_core::{CacheEntry, DecodeError, Expiry, HoardResult, StoreError};

/// Magic bytes identifying a hoard entry file.
const MAGIC: [u8; 2] = *b"HD";

/// Current entry format version.
const VERSION: u8 = 1;

/// Expiry flag values.
const EXPIRY_NEVER: u8 = 0;
const EXPIRY_AT: u8 = 1;

/// Size of the fixed header preceding key and payload.
pub const HEADER_LEN: usize = 16;

/// Encode an entry to its on-disk representation.
pub fn encode(entry: &CacheEntry) -> HoardResult<Vec<u8>> {
    let key_len = u32::try_from(entry.key.len()).map_err(|_| StoreError::Serialize {
        reason: format!("key of {} bytes exceeds the format limit", entry.key.len()),
    })?;

    let (flag, millis) = match entry.expiry {
        Expiry::Never => (EXPIRY_NEVER, 0i64),
        Expiry::At(t) => (EXPIRY_AT, t.timestamp_millis()),
    };

    let mut bytes = Vec::with_capacity(HEADER_LEN + entry.key.len() + entry.payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.push(VERSION);
    bytes.push(flag);
    bytes.extend_from_slice(&millis.to_le_bytes());
    bytes.extend_from_slice(&key_len.to_le_bytes());
    bytes.extend_from_slice(entry.key.as_bytes());
    bytes.extend_from_slice(&entry.payload);
    Ok(bytes)
}

/// Decode only the expiry from an entry's bytes.
///
/// Reads the fixed header and nothing else; this is the cheap partial
/// decode the pruner relies on to avoid deserializing large payloads.
pub fn decode_expiry(bytes: &[u8]) -> Result<Expiry, DecodeError> {
    let header = parse_header(bytes)?;
    Ok(header.expiry)
}

/// Decode a full entry.
pub fn decode(bytes: &[u8]) -> Result<CacheEntry, DecodeError> {
    let header = parse_header(bytes)?;

    let body = &bytes[HEADER_LEN..];
    if body.len() < header.key_len {
        return Err(DecodeError::KeyLengthMismatch {
            declared: header.key_len,
            available: body.len(),
        });
    }
    let key = std::str::from_utf8(&body[..header.key_len])
        .map_err(|_| DecodeError::KeyNotUtf8)?
        .to_owned();
    let payload = body[header.key_len..].to_vec();

    Ok(CacheEntry {
        key,
        payload,
        expiry: header.expiry,
    })
}

struct Header {
    expiry: Expiry,
    key_len: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            needed: HEADER_LEN,
            got: bytes.len(),
        });
    }
    if bytes[0..2] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    if bytes[2] != VERSION {
        return Err(DecodeError::UnsupportedVersion { version: bytes[2] });
    }

    let millis_bytes: [u8; 8] = bytes[4..12]
        .try_into()
        .map_err(|_| DecodeError::Truncated {
            needed: HEADER_LEN,
            got: bytes.len(),
        })?;
    let millis = i64::from_le_bytes(millis_bytes);

    let expiry = match bytes[3] {
        EXPIRY_NEVER => {
            // A never-expires entry must have a zeroed timestamp field;
            // anything else is corruption.
            if millis != 0 {
                return Err(DecodeError::InvalidExpiry {
                    reason: format!("never-expires entry carries timestamp {millis}"),
                });
            }
            Expiry::Never
        }
        EXPIRY_AT => {
            let at = Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| DecodeError::InvalidExpiry {
                    reason: format!("timestamp {millis} is out of range"),
                })?;
            Expiry::At(at)
        }
        other => {
            return Err(DecodeError::InvalidExpiry {
                reason: format!("unknown expiry flag {other}"),
            })
        }
    };

    let key_len_bytes: [u8; 4] = bytes[12..16]
        .try_into()
        .map_err(|_| DecodeError::Truncated {
            needed: HEADER_LEN,
            got: bytes.len(),
        })?;
    let key_len = u32::from_le_bytes(key_len_bytes) as usize;

    Ok(Header { expiry, key_len })
}
