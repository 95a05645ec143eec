//! Core types and utilities for the ECHONET Lite protocol
//!
//! This crate provides the error taxonomy, hex/byte conversions, the shared
//! transaction id counter and the device data model used by every other
//! layer of the client.

pub mod device;
pub mod error;
pub mod hex;
pub mod tid;
pub mod value;

pub use device::{DeviceRecord, DEFAULT_HEADER, DEFAULT_PORT};
pub use error::{EchonetError, EchonetResult};
pub use self::hex::{bytes_to_hex, hex_to_bytes, minimal_bytes};
pub use tid::{TransactionId, TransactionIdGenerator};
pub use value::DecodedValue;
