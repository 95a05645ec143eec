//! UDP transport implementation

use crate::datagram::{Datagram, DatagramTransport, Received};
use async_trait::async_trait;
use bytes::Bytes;
use echonet_core::{bytes_to_hex, EchonetError, EchonetResult, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;

/// Receive buffer size; longer datagrams are truncated
pub const MAX_PACKET_SIZE: usize = 512;

/// Default time to wait for a reply
///
/// Exchanges pass their own deadline to `receive`; this is the value the
/// client uses unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// UDP transport layer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpSettings {
    /// Local address the receive socket binds to
    pub bind_address: IpAddr,
    /// Local port the receive socket binds to; 0 picks an ephemeral port
    pub receive_port: u16,
}

impl UdpSettings {
    /// Create settings bound to all interfaces on `receive_port`
    pub fn new(receive_port: u16) -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            receive_port,
        }
    }

    pub fn with_bind_address(mut self, bind_address: IpAddr) -> Self {
        self.bind_address = bind_address;
        self
    }

    fn local_address(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.receive_port)
    }
}

impl Default for UdpSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

/// UDP transport layer implementation
///
/// The same socket is used for sending and receiving, so replies addressed
/// to the configured receive port land on it.
#[derive(Debug)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    settings: UdpSettings,
}

impl UdpTransport {
    /// Create a new UDP transport; no socket is bound yet
    pub fn new(settings: UdpSettings) -> Self {
        Self {
            socket: None,
            settings,
        }
    }

    pub fn settings(&self) -> &UdpSettings {
        &self.settings
    }

    /// Bind the receive socket if it is not open yet
    ///
    /// # Errors
    /// Returns `EchonetError::Transport` if the bind fails, for example when
    /// another exchange already holds the receive port
    pub async fn connect(&mut self) -> EchonetResult<&UdpSocket> {
        if self.socket.is_none() {
            let local = self.settings.local_address();
            let socket = UdpSocket::bind(local).await.map_err(|e| {
                EchonetError::Transport(std::io::Error::new(
                    e.kind(),
                    format!("Failed to bind {}: {}", local, e),
                ))
            })?;
            log::debug!("Bound UDP socket on {}", local);
            self.socket = Some(socket);
        }
        match self.socket.as_ref() {
            Some(socket) => Ok(socket),
            None => Err(EchonetError::Transport(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "UDP socket not open",
            ))),
        }
    }

    /// Address the socket is bound to, if open
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    async fn resolve(&self, host: &str, port: u16) -> EchonetResult<SocketAddr> {
        let candidates: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| EchonetError::UnknownHost(format!("{}: {}", host, e)))?
            .collect();

        let want_v4 = self.settings.bind_address.is_ipv4();
        candidates
            .iter()
            .find(|addr| addr.is_ipv4() == want_v4)
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| EchonetError::UnknownHost(host.to_string()))
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send(&mut self, frame: &[u8], host: &str, port: u16) -> EchonetResult<SocketAddr> {
        if frame.is_empty() {
            return Err(EchonetError::InvalidFrame(
                "Refusing to send an empty datagram".to_string(),
            ));
        }

        let target = self.resolve(host, port).await?;
        let socket = self.connect().await?;
        socket.send_to(frame, target).await?;

        log::debug!("Sent {} to {}", bytes_to_hex(frame), target);
        Ok(target)
    }

    async fn receive(&mut self, timeout: Duration) -> EchonetResult<Received> {
        let Some(socket) = self.socket.as_ref() else {
            log::debug!("Receive requested without an open socket");
            return Ok(Received::NoReply);
        };

        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let (len, source) = match tokio::time::timeout(timeout, socket.recv_from(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => {
                log::debug!("No datagram within {:?}", timeout);
                return Ok(Received::NoReply);
            }
        };

        buf.truncate(len);
        log::debug!("Received {} from {}", bytes_to_hex(&buf), source);
        Ok(Received::Datagram(Datagram {
            payload: Bytes::from(buf),
            source,
        }))
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            log::debug!("Closed UDP socket on port {}", self.settings.receive_port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn loopback_settings() -> UdpSettings {
        UdpSettings::new(0).with_bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[test]
    fn test_udp_settings_defaults() {
        let settings = UdpSettings::default();
        assert_eq!(settings.receive_port, 3610);
        assert!(settings.bind_address.is_unspecified());
    }

    #[tokio::test]
    async fn test_send_and_receive_reply() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let device_port = device.local_addr().unwrap().port();

        let mut transport = UdpTransport::new(loopback_settings());
        let target = assert_ok!(transport.send(&[0x10, 0x81, 0x00, 0x01], "127.0.0.1", device_port).await);
        assert_eq!(target.port(), device_port);

        let mut buf = [0u8; 64];
        let (len, from) = device.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[0x10, 0x81, 0x00, 0x01]);
        device.send_to(&[0x10, 0x81, 0x00, 0x01, 0x72], from).await.unwrap();

        match assert_ok!(transport.receive(Duration::from_secs(1)).await) {
            Received::Datagram(datagram) => {
                assert_eq!(&datagram.payload[..], &[0x10, 0x81, 0x00, 0x01, 0x72]);
                assert_eq!(datagram.source.port(), device_port);
            }
            Received::NoReply => panic!("expected a datagram"),
        }
    }

    #[tokio::test]
    async fn test_empty_datagram_keeps_source() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let device_port = device.local_addr().unwrap().port();

        let mut transport = UdpTransport::new(loopback_settings());
        assert_ok!(transport.send(&[0x01], "127.0.0.1", device_port).await);
        let (_, from) = device.recv_from(&mut [0u8; 8]).await.unwrap();
        device.send_to(&[], from).await.unwrap();

        match assert_ok!(transport.receive(Duration::from_secs(1)).await) {
            Received::Datagram(datagram) => {
                assert!(datagram.payload.is_empty());
                assert_eq!(datagram.source.port(), device_port);
            }
            Received::NoReply => panic!("expected the empty datagram"),
        }
    }

    #[tokio::test]
    async fn test_receive_times_out_as_no_reply() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let device_port = device.local_addr().unwrap().port();

        let mut transport = UdpTransport::new(loopback_settings());
        assert_ok!(transport.send(&[0x01], "127.0.0.1", device_port).await);

        let received = assert_ok!(transport.receive(Duration::from_millis(100)).await);
        assert!(received.is_no_reply());
    }

    #[tokio::test]
    async fn test_receive_without_socket_is_no_reply() {
        let mut transport = UdpTransport::new(loopback_settings());
        assert!(!transport.is_open());
        let received = assert_ok!(transport.receive(Duration::from_millis(10)).await);
        assert!(received.is_no_reply());
    }

    #[tokio::test]
    async fn test_send_empty_frame_rejected() {
        let mut transport = UdpTransport::new(loopback_settings());
        let err = assert_err!(transport.send(&[], "127.0.0.1", 3610).await);
        assert!(matches!(err, EchonetError::InvalidFrame(_)));
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_transport_error() {
        let holder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = holder.local_addr().unwrap().port();

        let settings = UdpSettings::new(port).with_bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let mut transport = UdpTransport::new(settings);
        let err = assert_err!(transport.send(&[0x01], "127.0.0.1", port).await);
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut transport = UdpTransport::new(loopback_settings());
        assert_ok!(transport.connect().await);
        assert!(transport.is_open());
        assert!(transport.local_addr().is_some());

        transport.disconnect();
        assert!(!transport.is_open());
        transport.disconnect();
        assert!(!transport.is_open());
    }
}
