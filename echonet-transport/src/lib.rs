//! Transport layer module for the ECHONET Lite protocol
//!
//! This crate provides the datagram transport used to exchange frames with
//! devices over UDP.

pub mod datagram;
pub mod udp;

pub use datagram::{Datagram, DatagramTransport, Received};
pub use echonet_core::{EchonetError, EchonetResult};
pub use udp::{UdpSettings, UdpTransport, DEFAULT_TIMEOUT, MAX_PACKET_SIZE};
