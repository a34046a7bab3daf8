//! HTTP-to-serial bridge for the HID relay.
//!
//! Browser actions arrive as small JSON requests and leave as command lines
//! on the serial port (see `hid_relay_proto` for the grammar). A single
//! writer thread owns the port so concurrent requests never interleave.

pub mod config;
pub mod error;
pub mod http;
pub mod routes;
pub mod serial;
pub mod server;
pub mod video;

pub use config::{BridgeConfig, GrammarConfig, Overrides};
pub use error::{BridgeError, Result};
pub use routes::AppState;
