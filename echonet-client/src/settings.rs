//! Client settings

use echonet_core::{DeviceRecord, EchonetError, EchonetResult};
use echonet_transport::{UdpSettings, DEFAULT_TIMEOUT};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Poll interval for bindings that do not set their own
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);

/// Which local port an exchange binds for replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceivePort {
    /// The device's configured port, which devices answer to by convention
    #[default]
    Device,
    /// A fixed port; 0 lets the OS choose
    Fixed(u16),
}

/// Which datagrams count as the reply to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFilter {
    /// The first datagram on the receive socket
    #[default]
    AcceptAny,
    /// Only datagrams from the device's address carrying the request's TID
    Strict,
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// How long an exchange waits for a reply
    pub timeout: Duration,
    /// Default poll interval
    pub refresh_interval: Duration,
    pub receive_port: ReceivePort,
    pub bind_address: IpAddr,
    pub reply_filter: ReplyFilter,
}

impl ClientSettings {
    /// Create settings with the protocol defaults
    ///
    /// # Defaults
    /// - Timeout: 2 seconds
    /// - Refresh interval: 60 seconds
    /// - Receive port: the device's port
    /// - Bind address: 0.0.0.0
    /// - Reply filter: accept any datagram
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            receive_port: ReceivePort::Device,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            reply_filter: ReplyFilter::AcceptAny,
        }
    }

    /// Read the global `refresh` key (milliseconds) from configuration pairs
    ///
    /// Other keys are left to the device directory.
    ///
    /// # Errors
    /// Returns `EchonetError::Config` if `refresh` is not an integer
    pub fn from_properties<I, K, V>(properties: I) -> EchonetResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::new();
        for (key, value) in properties {
            let value = value.as_ref().trim();
            if key.as_ref().trim().eq_ignore_ascii_case("refresh") && !value.is_empty() {
                let millis = value.parse::<u64>().map_err(|e| {
                    EchonetError::Config(format!("refresh: invalid interval {:?}: {}", value, e))
                })?;
                settings.refresh_interval = Duration::from_millis(millis);
            }
        }
        Ok(settings)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_receive_port(mut self, receive_port: ReceivePort) -> Self {
        self.receive_port = receive_port;
        self
    }

    pub fn with_bind_address(mut self, bind_address: IpAddr) -> Self {
        self.bind_address = bind_address;
        self
    }

    pub fn with_reply_filter(mut self, reply_filter: ReplyFilter) -> Self {
        self.reply_filter = reply_filter;
        self
    }

    /// Transport settings for an exchange with `device`
    pub fn udp_settings(&self, device: &DeviceRecord) -> UdpSettings {
        let port = match self.receive_port {
            ReceivePort::Device => device.port(),
            ReceivePort::Fixed(port) => port,
        };
        UdpSettings::new(port).with_bind_address(self.bind_address)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(2));
        assert_eq!(settings.refresh_interval, Duration::from_secs(60));
        assert_eq!(settings.reply_filter, ReplyFilter::AcceptAny);
    }

    #[test]
    fn test_from_properties() {
        let settings =
            ClientSettings::from_properties([("refresh", "5000"), ("lamp.host", "10.0.0.2")]).unwrap();
        assert_eq!(settings.refresh_interval, Duration::from_millis(5000));

        assert!(matches!(
            ClientSettings::from_properties([("refresh", "soon")]),
            Err(EchonetError::Config(_))
        ));
    }

    #[test]
    fn test_udp_settings_follow_receive_port() {
        let device = DeviceRecord::new("lamp").with_port(3611);
        let settings = ClientSettings::new();
        assert_eq!(settings.udp_settings(&device).receive_port, 3611);

        let settings = settings.with_receive_port(ReceivePort::Fixed(0));
        assert_eq!(settings.udp_settings(&device).receive_port, 0);
    }
}
