//! Device connection parameters

use crate::error::{EchonetError, EchonetResult};
use crate::hex::bytes_to_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default ECHONET Lite UDP port
pub const DEFAULT_PORT: u16 = 3610;

/// Default EHD1/EHD2 header: ECHONET Lite, specified message format
pub const DEFAULT_HEADER: [u8; 2] = [0x10, 0x81];

/// Connection parameters for one configured device
///
/// `edata_head` is the fixed prefix written after the TID: SEOJ, DEOJ, ESV,
/// OPC and whatever else the device needs before the property code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    key: String,
    host: Option<String>,
    port: u16,
    header: [u8; 2],
    #[serde(with = "serde_bytes")]
    edata_head: Vec<u8>,
}

impl DeviceRecord {
    /// Create a record with default port and header and no host
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            host: None,
            port: DEFAULT_PORT,
            header: DEFAULT_HEADER,
            edata_head: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_header(mut self, header: [u8; 2]) -> Self {
        self.header = header;
        self
    }

    pub fn with_edata_head(mut self, edata_head: Vec<u8>) -> Self {
        self.edata_head = edata_head;
        self
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn set_header(&mut self, header: [u8; 2]) {
        self.header = header;
    }

    pub fn set_edata_head(&mut self, edata_head: Vec<u8>) {
        self.edata_head = edata_head;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Host name, or a configuration error naming the device
    pub fn require_host(&self) -> EchonetResult<&str> {
        self.host().ok_or_else(|| {
            EchonetError::Config(format!("Device '{}' has no host configured", self.key))
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn header(&self) -> [u8; 2] {
        self.header
    }

    pub fn edata_head(&self) -> &[u8] {
        &self.edata_head
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{}, ehd={}, edata_head={})",
            self.key,
            self.host.as_deref().unwrap_or("<unset>"),
            self.port,
            bytes_to_hex(&self.header),
            bytes_to_hex(&self.edata_head)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let device = DeviceRecord::new("aircon");
        assert_eq!(device.port(), 3610);
        assert_eq!(device.header(), [0x10, 0x81]);
        assert!(device.edata_head().is_empty());
        assert!(matches!(device.require_host(), Err(EchonetError::Config(_))));
    }

    #[test]
    fn test_display() {
        let device = DeviceRecord::new("aircon")
            .with_host("192.168.1.20")
            .with_edata_head(vec![0x05, 0xFF, 0x01]);
        assert_eq!(
            device.to_string(),
            "aircon (192.168.1.20:3610, ehd=1081, edata_head=05FF01)"
        );
    }
}
