use thiserror::Error;

/// Main error type for ECHONET Lite operations
///
/// Only failures live here. Outcomes the protocol treats as normal (no reply
/// within the deadline, a device-reported error, a short or unrecognised
/// response) are classifications of the reply, not errors.
#[derive(Error, Debug)]
pub enum EchonetError {
    /// Socket, bind or I/O failure
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Host name could not be resolved to a socket address
    #[error("Could not resolve host: {0}")]
    UnknownHost(String),

    /// Malformed hex input
    #[error("Decode error: {0}")]
    Decode(String),

    /// A frame could not be built from the supplied parts
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// No device record is configured under the given key
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Binding error: {0}")]
    Binding(String),
}

impl EchonetError {
    /// Whether the error came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(self, EchonetError::Transport(_) | EchonetError::UnknownHost(_))
    }
}

/// Result type alias for ECHONET Lite operations
pub type EchonetResult<T> = Result<T, EchonetError>;
