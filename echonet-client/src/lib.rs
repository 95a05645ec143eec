//! ECHONET Lite client implementation
//!
//! This crate provides the client side of the protocol: the device
//! directory, request/response sessions against configured devices, item
//! bindings, and the controller that polls bound items and forwards
//! commands.
//!
//! # Flow
//!
//! - `DeviceDirectory` is loaded from `<device>.host|port|ehd|edata_head`
//!   properties and shared through `SharedDirectory`
//! - `RequestSession` runs one exchange per call over its own UDP socket and
//!   publishes acknowledged values to an `EventSink`
//! - `ItemController` maps items to requests through a `BindingRegistry`

pub mod binding;
pub mod controller;
pub mod directory;
pub mod payload;
pub mod session;
pub mod settings;
pub mod sink;

pub use binding::{
    BindingRegistry, CommandBinding, ItemBinding, PollBinding, PropertyTarget, VALUE_PREFIX,
    WILDCARD_COMMAND,
};
pub use controller::ItemController;
pub use directory::{DeviceDirectory, SharedDirectory};
pub use payload::{ItemValue, Payload};
pub use session::{Exchange, Request, RequestSession};
pub use settings::{ClientSettings, ReceivePort, ReplyFilter, DEFAULT_REFRESH_INTERVAL};
pub use sink::{ChannelSink, EventSink, ValueCache};
