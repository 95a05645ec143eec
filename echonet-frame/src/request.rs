//! Request frame encoding
//!
//! Layout: `EHD(2) TID(2) EDATA-HEAD(n) EPC(1) PDC(1) EDT(PDC)`. The edata
//! head is the per-device constant prefix (SEOJ, DEOJ, ESV, OPC, ...).

use bytes::{BufMut, Bytes, BytesMut};
use echonet_core::{
    bytes_to_hex, hex_to_bytes, DeviceRecord, EchonetError, EchonetResult, TransactionId,
    TransactionIdGenerator,
};
use std::fmt;

/// Largest EDT a single-byte PDC can describe
pub const MAX_EDT_LENGTH: usize = 255;

/// An encoded request, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    tid: TransactionId,
    bytes: Bytes,
}

impl RequestFrame {
    /// Build a request with a fresh TID from `tids`
    ///
    /// # Arguments
    /// * `device` - Target device, supplies EHD and edata head
    /// * `property_code` - EPC as hex, e.g. `"80"`
    /// * `payload` - EDT bytes, may be empty for reads
    /// * `tids` - TID source
    ///
    /// # Errors
    /// Returns error if the device has no edata head, the property code is
    /// not one hex byte, or the payload exceeds 255 bytes. No TID is consumed
    /// when validation fails.
    pub fn build(
        device: &DeviceRecord,
        property_code: &str,
        payload: &[u8],
        tids: &TransactionIdGenerator,
    ) -> EchonetResult<Self> {
        let epc = parse_property_code(property_code)?;
        validate(device, payload)?;
        Ok(Self::encode(device, tids.next(), epc, payload))
    }

    /// Build a request with an explicit TID
    pub fn with_tid(
        device: &DeviceRecord,
        tid: TransactionId,
        epc: u8,
        payload: &[u8],
    ) -> EchonetResult<Self> {
        validate(device, payload)?;
        Ok(Self::encode(device, tid, epc, payload))
    }

    fn encode(device: &DeviceRecord, tid: TransactionId, epc: u8, payload: &[u8]) -> Self {
        let edata_head = device.edata_head();
        let mut buf = BytesMut::with_capacity(2 + 2 + edata_head.len() + 2 + payload.len());
        buf.put_slice(&device.header());
        buf.put_slice(&tid.to_bytes());
        buf.put_slice(edata_head);
        buf.put_u8(epc);
        buf.put_u8(payload.len() as u8);
        buf.put_slice(payload);

        Self {
            tid,
            bytes: buf.freeze(),
        }
    }

    pub fn tid(&self) -> TransactionId {
        self.tid
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for RequestFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes_to_hex(&self.bytes))
    }
}

fn parse_property_code(property_code: &str) -> EchonetResult<u8> {
    match hex_to_bytes(property_code.trim())?.as_slice() {
        [epc] => Ok(*epc),
        other => Err(EchonetError::InvalidFrame(format!(
            "Property code must be exactly one byte, got {} bytes ({:?})",
            other.len(),
            property_code
        ))),
    }
}

fn validate(device: &DeviceRecord, payload: &[u8]) -> EchonetResult<()> {
    if device.edata_head().is_empty() {
        return Err(EchonetError::InvalidFrame(format!(
            "Device '{}' has no edata head configured",
            device.key()
        )));
    }
    if payload.len() > MAX_EDT_LENGTH {
        return Err(EchonetError::InvalidFrame(format!(
            "Payload of {} bytes exceeds the {} byte PDC limit",
            payload.len(),
            MAX_EDT_LENGTH
        )));
    }
    Ok(())
}
