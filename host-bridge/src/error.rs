//! Error types for the host bridge.

use hid_relay_proto::EncodeError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to open serial port {port}: {source}")]
    OpenPort {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial write failed: {0}")]
    SerialWrite(#[source] std::io::Error),

    #[error("serial writer is not running")]
    WriterClosed,

    #[error("cannot encode command: {0}")]
    Encode(#[from] EncodeError),

    #[error("video capture unavailable: {0}")]
    Video(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
