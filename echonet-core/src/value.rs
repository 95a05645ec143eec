//! Values published to the item sink

use crate::hex::bytes_to_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value decoded from an acknowledged reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedValue {
    /// EDT read as an unsigned big-endian integer
    Number(u64),
    /// EDT too wide for a `u64`, kept as uppercase hex
    Hex(String),
}

impl DecodedValue {
    /// Interpret an EDT payload
    ///
    /// Payloads of up to 8 bytes become `Number`, anything wider stays as
    /// hex text. An empty payload carries no value.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload.len() {
            0 => None,
            1..=8 => Some(DecodedValue::Number(
                payload.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
            )),
            _ => Some(DecodedValue::Hex(bytes_to_hex(payload))),
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            DecodedValue::Number(n) => Some(*n),
            DecodedValue::Hex(_) => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Number(n) => write!(f, "{}", n),
            DecodedValue::Hex(s) => f.write_str(s),
        }
    }
}
