//! Datagram transport trait

use async_trait::async_trait;
use bytes::Bytes;
use echonet_core::EchonetResult;
use std::net::SocketAddr;
use std::time::Duration;

/// One datagram read from the receive socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Bytes,
    pub source: SocketAddr,
}

/// Outcome of waiting for a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Datagram(Datagram),
    /// Timeout or no open socket to read from
    NoReply,
}

impl Received {
    pub fn is_no_reply(&self) -> bool {
        matches!(self, Received::NoReply)
    }
}

/// Request/response datagram exchange with a device
///
/// A transport owns at most one socket. It is opened on first use and
/// released by `disconnect`. Implementations are not shared between
/// concurrent exchanges.
#[async_trait]
pub trait DatagramTransport: Send {
    /// Send `frame` to `host:port`
    ///
    /// # Returns
    /// The resolved destination address
    ///
    /// # Errors
    /// Returns error if the host cannot be resolved, the socket cannot be
    /// bound, or the write fails
    async fn send(&mut self, frame: &[u8], host: &str, port: u16) -> EchonetResult<SocketAddr>;

    /// Wait up to `timeout` for the next datagram
    ///
    /// Timing out is not an error: it yields `Received::NoReply`.
    ///
    /// # Errors
    /// Returns error on socket I/O failure
    async fn receive(&mut self, timeout: Duration) -> EchonetResult<Received>;

    /// Check if the socket is open
    fn is_open(&self) -> bool;

    /// Close and release the socket; calling it again has no effect
    fn disconnect(&mut self);
}
