//! UART command line to USB HID keyboard and mouse relay for RP2040.
//!
//! This crate provides the embedded side of the HID relay: it reads command
//! lines from UART and replays them as USB HID keyboard and mouse reports.

#![no_std]

// Re-export core types for convenience
pub use hid_relay_core::{
    CommandRelay, Grammar, InputError, InputSource, KeyboardReport, Line, MouseReport, Outcome,
    OutputError, OutputSink, RelayError, MAX_LINE_LENGTH,
};

pub mod uart_input;
pub mod usb_output;

pub use uart_input::{ChannelInput, LineChannel, LineMessage, UartLineReader, LINE_QUEUE_DEPTH};
pub use usb_output::{configure_usb_hid, HidRequestHandler, UsbHidOutput};

/// Command grammar compiled into this firmware.
#[cfg(not(feature = "legacy-grammar"))]
pub const GRAMMAR: Grammar = Grammar::Current;

/// Command grammar compiled into this firmware.
#[cfg(feature = "legacy-grammar")]
pub const GRAMMAR: Grammar = Grammar::Legacy;
