//! Input source trait and error types.

use core::future::Future;
use hid_relay_proto::MAX_LINE_LENGTH;

/// One received command line, without its terminating newline.
pub type Line = heapless::Vec<u8, MAX_LINE_LENGTH>;

/// Error type for input operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// UART/communication I/O error.
    Io,
    /// Connection lost / input closed.
    Disconnected,
    /// Buffer overflow (line too long, or receiver overrun).
    BufferOverflow,
    /// UART framing error.
    Framing,
    /// UART break condition.
    Break,
}

/// Async trait for command line sources.
///
/// This trait abstracts where command lines come from (UART, a channel fed
/// by a UART task, a test script).
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait InputSource {
    /// Wait for and receive the next command line.
    fn receive(&mut self) -> impl Future<Output = Result<Line, InputError>>;

    /// Return a line only if one is already buffered.
    ///
    /// Used between keystrokes while typing; errors are left for the next
    /// [`receive`](Self::receive).
    fn try_receive(&mut self) -> Option<Line>;

    /// Check if the input source is connected/ready.
    fn is_connected(&self) -> bool;
}
