//! Hex string and byte buffer conversions
//!
//! Property codes, EDT payloads and frame header constants are all written
//! as hex text in configuration and bindings. Received frames are rendered
//! back to uppercase hex for logging and inspection.

use crate::error::{EchonetError, EchonetResult};
use ::hex::FromHexError;

/// Decode a hex string into bytes
///
/// Both upper and lower case digits are accepted. The empty string decodes
/// to an empty buffer.
///
/// # Errors
/// Returns `EchonetError::Decode` if the length is odd or a character is not
/// a hex digit.
pub fn hex_to_bytes(s: &str) -> EchonetResult<Vec<u8>> {
    ::hex::decode(s).map_err(|e| match e {
        FromHexError::OddLength => {
            EchonetError::Decode(format!("Hex string has odd length {}: {:?}", s.len(), s))
        }
        FromHexError::InvalidHexCharacter { c, index } => EchonetError::Decode(format!(
            "Invalid hex digit {:?} at position {} in {:?}",
            c, index, s
        )),
        other => EchonetError::Decode(format!("{}: {:?}", other, s)),
    })
}

/// Encode bytes as uppercase hex, two characters per byte
pub fn bytes_to_hex(buf: &[u8]) -> String {
    ::hex::encode_upper(buf)
}

/// Shortest big-endian encoding of `value`
///
/// Leading zero bytes are stripped, but zero itself is encoded as a single
/// `0x00` byte so the result is never empty.
pub fn minimal_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}
