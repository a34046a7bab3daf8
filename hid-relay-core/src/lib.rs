//! Platform-agnostic HID command relay.
//!
//! This crate turns command lines into USB HID keyboard and mouse reports
//! without any platform-specific dependencies. It can be used both in
//! embedded `no_std` environments and on host for testing.
//!
//! # Overview
//!
//! - [`report`]: Boot-protocol reports ([`KeyboardReport`], [`MouseReport`])
//! - [`action`]: HID effects of a command ([`HidAction`])
//! - [`typing`]: Keystroke-at-a-time text walking ([`TextCursor`])
//! - [`input`]: Input source trait ([`InputSource`])
//! - [`output`]: Output sink trait ([`OutputSink`])
//! - [`relay`]: Orchestrates input-to-output flow ([`CommandRelay`])
//!
//! # Example
//!
//! ```rust
//! use hid_relay_core::{HidAction, MouseAction, MouseReport};
//!
//! if let HidAction::Move { dx, dy } = HidAction::from(MouseAction::Up) {
//!     assert_eq!(MouseReport::movement(dx, dy).as_bytes(), [0, 0, 0xF6, 0]);
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod action;
pub mod input;
pub mod output;
pub mod relay;
pub mod report;
pub mod typing;

// Re-export main types at crate root
pub use action::{HidAction, KEYSTROKE_INTERVAL_MS, MOVE_STEP};
pub use hid_relay_proto::{
    parse_command, Command, Grammar, Keystroke, MouseAction, MouseButton, NamedKey, ParseError,
    LINE_QUEUE_DEPTH, MAX_LINE_LENGTH,
};
pub use input::{InputError, InputSource, Line};
pub use output::{OutputError, OutputSink};
pub use relay::{CommandRelay, Outcome, RelayError};
pub use report::{KeyboardReport, MouseReport, KEYBOARD_REPORT_SIZE, MOUSE_REPORT_SIZE};
pub use typing::TextCursor;
