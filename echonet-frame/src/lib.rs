//! Frame layer for the ECHONET Lite protocol
//!
//! This crate builds request frames and classifies the replies devices send
//! back. Replies are read through fixed header offsets; only the first
//! property of a reply is consumed.

pub mod esv;
pub mod reader;
pub mod request;
pub mod response;

pub use echonet_core::{EchonetError, EchonetResult};
pub use esv::ServiceCode;
pub use reader::FrameReader;
pub use request::{RequestFrame, MAX_EDT_LENGTH};
pub use response::{ResponseFrame, FALLBACK_PAYLOAD, NO_DATA_SENTINEL};
