//! echonet - Rust implementation of an ECHONET Lite UDP client
//!
//! This library builds ECHONET Lite request frames, exchanges them with
//! appliances over UDP and classifies the replies.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `echonet-core`: Error handling, hex conversions, transaction ids, device records
//! - `echonet-transport`: UDP datagram transport
//! - `echonet-frame`: Request encoding and reply classification
//! - `echonet-client`: Device directory, request sessions, item bindings
//!
//! # Usage
//!
//! ```no_run
//! use echonet::client::{
//!     ChannelSink, ClientSettings, DeviceDirectory, Request, RequestSession, SharedDirectory,
//!     ValueCache,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> echonet::EchonetResult<()> {
//! let directory = DeviceDirectory::from_properties([
//!     ("aircon.host", "192.168.1.20"),
//!     ("aircon.edata_head", "05FF010130016201"),
//! ])?;
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
//! let session = RequestSession::new(
//!     Arc::new(SharedDirectory::new(directory)),
//!     Arc::new(ChannelSink::new(tx)),
//!     Arc::new(ValueCache::new()),
//!     ClientSettings::default(),
//! );
//! let exchange = session.execute(&Request::read("aircon_power", "aircon", "80")).await?;
//! println!("{}", exchange.response);
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use echonet_core::{
    DecodedValue, DeviceRecord, EchonetError, EchonetResult, TransactionId,
    TransactionIdGenerator,
};

// Re-export client API
pub mod client {
    pub use echonet_client::*;
}

// Re-export frame layer
pub mod frame {
    pub use echonet_frame::*;
}

// Re-export transport layer
pub mod transport {
    pub use echonet_transport::*;
}

// Re-export hex helpers
pub mod hex {
    pub use echonet_core::hex::*;
}
