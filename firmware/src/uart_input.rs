use embassy_rp::uart::{Async, Error as UartError, UartRx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use hid_relay_core::{InputError, InputSource, Line};

pub use hid_relay_core::LINE_QUEUE_DEPTH;

/// A received line, or the UART error that interrupted it.
pub type LineMessage = Result<Line, InputError>;

/// Queue from the UART task to the relay task.
pub type LineChannel = Channel<CriticalSectionRawMutex, LineMessage, LINE_QUEUE_DEPTH>;

/// Newline-framed reader over a UART receiver.
///
/// # Pins
///
/// Uses UART0 by default:
/// - GPIO 0: TX
/// - GPIO 1: RX
/// - GPIO 2: CTS (optional, with `uart-flow-control` feature)
/// - GPIO 3: RTS (optional, with `uart-flow-control` feature)
pub struct UartLineReader<'d> {
    rx: UartRx<'d, Async>,
}

impl<'d> UartLineReader<'d> {
    /// Create a new line reader from the given UART receiver.
    pub fn new(rx: UartRx<'d, Async>) -> Self {
        Self { rx }
    }

    /// Read bytes until a newline is found.
    ///
    /// The newline is not included. If a line exceeds the buffer capacity,
    /// the rest of the line is discarded so the next read starts on a fresh
    /// line.
    pub async fn read_line(&mut self) -> Result<Line, InputError> {
        let mut line = Line::new();

        loop {
            let mut byte = [0u8; 1];
            self.rx.read(&mut byte).await.map_err(map_uart_error)?;

            if byte[0] == b'\n' {
                return Ok(line);
            }

            if line.push(byte[0]).is_err() {
                // Buffer overflow - discard rest of line until newline
                loop {
                    self.rx.read(&mut byte).await.map_err(map_uart_error)?;
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                return Err(InputError::BufferOverflow);
            }
        }
    }
}

/// Input source fed by the UART task through a [`LineChannel`].
///
/// This lets the UART be drained while the relay is busy typing.
pub struct ChannelInput<'a> {
    rx: Receiver<'a, CriticalSectionRawMutex, LineMessage, LINE_QUEUE_DEPTH>,
}

impl<'a> ChannelInput<'a> {
    pub fn new(channel: &'a LineChannel) -> Self {
        Self {
            rx: channel.receiver(),
        }
    }
}

impl<'a> InputSource for ChannelInput<'a> {
    async fn receive(&mut self) -> Result<Line, InputError> {
        self.rx.receive().await
    }

    fn try_receive(&mut self) -> Option<Line> {
        // An error popped here is dropped; keys are released after every
        // keystroke anyway.
        self.rx.try_receive().ok()?.ok()
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Map a UART error onto the input error set.
fn map_uart_error(e: UartError) -> InputError {
    match e {
        UartError::Framing => InputError::Framing,
        UartError::Break => InputError::Break,
        UartError::Overrun => InputError::BufferOverflow,
        UartError::Parity => InputError::Io,
        _ => InputError::Io,
    }
}
