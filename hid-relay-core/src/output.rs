//! Output sink trait and error types.

use core::future::Future;

use crate::report::{KeyboardReport, MouseReport};

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint disabled by the host.
    Disabled,
}

/// Async trait for HID report sinks.
///
/// Keyboard and mouse reports go to separate endpoints, so a sink exposes
/// one method for each.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait OutputSink {
    /// Send a keyboard report.
    ///
    /// May block until the previous report has been sent.
    fn send_keyboard(
        &mut self,
        report: &KeyboardReport,
    ) -> impl Future<Output = Result<(), OutputError>>;

    /// Send a mouse report.
    fn send_mouse(&mut self, report: &MouseReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the output is ready to accept data.
    fn is_ready(&self) -> bool;
}
