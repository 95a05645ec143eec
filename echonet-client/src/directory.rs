//! Device directory
//!
//! Maps device keys to their connection parameters. A directory is built
//! once from configuration and never mutated afterwards; reconfiguration
//! builds a new one and swaps it into the `SharedDirectory`.

use echonet_core::{hex_to_bytes, DeviceRecord, EchonetError, EchonetResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;

static DEVICE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\.(host|port|ehd|edata_head)$").expect("valid device property pattern")
});

/// Immutable device key to record mapping
///
/// Keys are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: HashMap<String, Arc<DeviceRecord>>,
}

impl DeviceDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `key = value` configuration pairs
    ///
    /// Recognised keys are `<device>.host`, `<device>.port`, `<device>.ehd`
    /// and `<device>.edata_head`. A record is created the first time a
    /// device is mentioned and later lines fill in its fields. Blank values
    /// and unrecognised keys are skipped.
    ///
    /// # Errors
    /// Returns `EchonetError::Config` if no properties are given or a value
    /// cannot be parsed
    pub fn from_properties<I, K, V>(properties: I) -> EchonetResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut records: HashMap<String, DeviceRecord> = HashMap::new();
        let mut seen_any = false;

        for (key, value) in properties {
            seen_any = true;
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let Some(captures) = DEVICE_PROPERTY.captures(key) else {
                continue;
            };

            let device = captures[1].to_lowercase();
            let field = captures[2].to_lowercase();
            let record = records
                .entry(device.clone())
                .or_insert_with(|| DeviceRecord::new(device));

            match field.as_str() {
                "host" => record.set_host(value),
                "port" => record.set_port(parse_port(key, value)?),
                "ehd" => record.set_header(parse_header(key, value)?),
                "edata_head" => record.set_edata_head(parse_hex(key, value)?),
                _ => {}
            }
        }

        if !seen_any {
            return Err(EchonetError::Config("Device configuration is empty".to_string()));
        }

        let directory = Self {
            devices: records
                .into_iter()
                .map(|(key, record)| (key, Arc::new(record)))
                .collect(),
        };
        log::debug!("Loaded {} device(s) from configuration", directory.len());
        Ok(directory)
    }

    /// Add or replace a record
    pub fn insert(&mut self, record: DeviceRecord) {
        self.devices
            .insert(record.key().to_lowercase(), Arc::new(record));
    }

    pub fn get(&self, key: &str) -> Option<Arc<DeviceRecord>> {
        self.devices.get(&key.to_lowercase()).cloned()
    }

    /// Look up a device, failing with `EchonetError::UnknownDevice`
    pub fn resolve(&self, key: &str) -> EchonetResult<Arc<DeviceRecord>> {
        self.get(key)
            .ok_or_else(|| EchonetError::UnknownDevice(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn parse_port(key: &str, value: &str) -> EchonetResult<u16> {
    value
        .parse::<u16>()
        .map_err(|e| EchonetError::Config(format!("{}: invalid port {:?}: {}", key, value, e)))
}

fn parse_hex(key: &str, value: &str) -> EchonetResult<Vec<u8>> {
    hex_to_bytes(value).map_err(|e| EchonetError::Config(format!("{}: {}", key, e)))
}

fn parse_header(key: &str, value: &str) -> EchonetResult<[u8; 2]> {
    let bytes = parse_hex(key, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        EchonetError::Config(format!(
            "{}: header must be exactly 2 bytes, got {}",
            key,
            bytes.len()
        ))
    })
}

/// Directory handle shared by concurrent exchanges
///
/// Exchanges take a snapshot; `replace` swaps the whole directory without
/// affecting records already handed out.
#[derive(Debug, Default)]
pub struct SharedDirectory {
    current: RwLock<Arc<DeviceDirectory>>,
}

impl SharedDirectory {
    pub fn new(directory: DeviceDirectory) -> Self {
        Self {
            current: RwLock::new(Arc::new(directory)),
        }
    }

    /// The directory as of now
    pub async fn snapshot(&self) -> Arc<DeviceDirectory> {
        Arc::clone(&*self.current.read().await)
    }

    /// Swap in a new directory, returning the previous one
    pub async fn replace(&self, directory: DeviceDirectory) -> Arc<DeviceDirectory> {
        let mut current = self.current.write().await;
        log::info!("Replacing device directory ({} device(s))", directory.len());
        std::mem::replace(&mut *current, Arc::new(directory))
    }

    /// Look up a device in the current directory
    pub async fn resolve(&self, key: &str) -> EchonetResult<Arc<DeviceRecord>> {
        self.current.read().await.resolve(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(&'static str, &'static str)> {
        vec![
            ("aircon.host", "192.168.1.20"),
            ("aircon.edata_head", "05FF010130016201"),
            ("Lamp.HOST", " 192.168.1.30 "),
            ("lamp.port", "3611"),
            ("lamp.ehd", "1082"),
            ("lamp.edata_head", ""),
            ("refresh", "60000"),
        ]
    }

    #[test]
    fn test_from_properties() {
        let directory = DeviceDirectory::from_properties(sample()).unwrap();
        assert_eq!(directory.len(), 2);

        let aircon = directory.resolve("aircon").unwrap();
        assert_eq!(aircon.host(), Some("192.168.1.20"));
        assert_eq!(aircon.port(), 3610);
        assert_eq!(aircon.header(), [0x10, 0x81]);
        assert_eq!(aircon.edata_head(), &[0x05, 0xFF, 0x01, 0x01, 0x30, 0x01, 0x62, 0x01]);

        let lamp = directory.resolve("LAMP").unwrap();
        assert_eq!(lamp.host(), Some("192.168.1.30"));
        assert_eq!(lamp.port(), 3611);
        assert_eq!(lamp.header(), [0x10, 0x82]);
        assert!(lamp.edata_head().is_empty());
    }

    #[test]
    fn test_unknown_device() {
        let directory = DeviceDirectory::from_properties(sample()).unwrap();
        assert!(matches!(
            directory.resolve("fridge"),
            Err(EchonetError::UnknownDevice(key)) if key == "fridge"
        ));
    }

    #[test]
    fn test_empty_configuration_rejected() {
        let empty: Vec<(&str, &str)> = Vec::new();
        assert!(matches!(
            DeviceDirectory::from_properties(empty),
            Err(EchonetError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DeviceDirectory::from_properties([("a.port", "http")]),
            Err(EchonetError::Config(_))
        ));
        assert!(matches!(
            DeviceDirectory::from_properties([("a.ehd", "108100")]),
            Err(EchonetError::Config(_))
        ));
        assert!(matches!(
            DeviceDirectory::from_properties([("a.edata_head", "0EF")]),
            Err(EchonetError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_keeps_snapshots() {
        let shared = SharedDirectory::new(DeviceDirectory::from_properties(sample()).unwrap());
        let before = shared.snapshot().await;
        let held = shared.resolve("aircon").await.unwrap();

        let mut next = DeviceDirectory::new();
        next.insert(DeviceRecord::new("fridge").with_host("192.168.1.40"));
        let previous = shared.replace(next).await;

        assert_eq!(previous.len(), 2);
        assert_eq!(before.len(), 2);
        assert_eq!(held.host(), Some("192.168.1.20"));
        assert!(shared.resolve("aircon").await.is_err());
        assert!(shared.resolve("Fridge").await.is_ok());
    }
}
