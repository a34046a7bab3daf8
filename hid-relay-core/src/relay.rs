//! CommandRelay: turns command lines into HID reports.

use embedded_hal_async::delay::DelayNs;
use hid_relay_proto::{parse_command, Command, Grammar, MouseAction, NamedKey, ParseError};

use crate::action::{HidAction, KEYSTROKE_INTERVAL_MS};
use crate::input::{InputError, InputSource, Line};
use crate::output::{OutputError, OutputSink};
use crate::report::{KeyboardReport, MouseReport};
use crate::typing::TextCursor;

/// What a dispatched line did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// A mouse move or click was sent.
    Mouse(MouseAction),
    /// A named key chord was sent.
    Key(NamedKey),
    /// A text payload was typed.
    Text { typed: usize, skipped: usize },
    /// The line was not a command; nothing was sent.
    Ignored(ParseError),
}

/// Relays command lines from an input source to a HID output sink.
///
/// One line is dispatched at a time. While a text payload is being typed the
/// relay checks the input between keystrokes:
/// - mouse commands are performed immediately, between two keystrokes;
/// - any other line is held back and dispatched after the current text
///   finishes. Polling stops until then, so later lines stay queued in
///   arrival order and lines that are not commands still surface as
///   [`Outcome::Ignored`].
///
/// # Error Handling
///
/// On input errors the relay sends an all-keys-released keyboard report so
/// no key stays stuck.
pub struct CommandRelay<I, O, D> {
    input: I,
    output: O,
    delay: D,
    grammar: Grammar,
    deferred: Option<Line>,
}

impl<I: InputSource, O: OutputSink, D: DelayNs> CommandRelay<I, O, D> {
    /// Create a new relay speaking `grammar`.
    pub fn new(input: I, output: O, delay: D, grammar: Grammar) -> Self {
        Self {
            input,
            output,
            delay,
            grammar,
            deferred: None,
        }
    }

    /// Run the relay indefinitely, reporting every result to `on_result`.
    pub async fn run<F>(&mut self, mut on_result: F) -> !
    where
        F: FnMut(&Result<Outcome, RelayError>),
    {
        loop {
            let result = self.process_one().await;
            on_result(&result);
        }
    }

    /// Dispatch the next line: a deferred one if present, otherwise the
    /// next line from the input.
    pub async fn process_one(&mut self) -> Result<Outcome, RelayError> {
        let line = match self.deferred.take() {
            Some(line) => line,
            None => match self.input.receive().await {
                Ok(line) => line,
                Err(e) => {
                    // Release everything to prevent stuck keys
                    let _ = self
                        .output
                        .send_keyboard(&KeyboardReport::released())
                        .await;
                    return Err(RelayError::Input(e));
                }
            },
        };
        self.dispatch_line(&line).await
    }

    /// Classify one line and perform its HID effect.
    ///
    /// Lines that are not commands return [`Outcome::Ignored`] and send
    /// nothing.
    pub async fn dispatch_line(&mut self, line: &[u8]) -> Result<Outcome, RelayError> {
        match parse_command(line, self.grammar) {
            Ok(Command::Mouse(action)) => {
                self.perform(action.into()).await?;
                Ok(Outcome::Mouse(action))
            }
            Ok(Command::Key(key)) => {
                self.perform(key.into()).await?;
                Ok(Outcome::Key(key))
            }
            Ok(Command::Text(payload)) => self.type_text(TextCursor::new(payload)).await,
            Err(e) => Ok(Outcome::Ignored(e)),
        }
    }

    async fn type_text(&mut self, mut cursor: TextCursor) -> Result<Outcome, RelayError> {
        let mut typed = 0;
        for stroke in cursor.by_ref() {
            self.perform(HidAction::Keystroke(stroke)).await?;
            typed += 1;
            self.delay.delay_ms(KEYSTROKE_INTERVAL_MS).await;
            self.poll_between_keystrokes().await?;
        }
        Ok(Outcome::Text {
            typed,
            skipped: cursor.skipped(),
        })
    }

    async fn poll_between_keystrokes(&mut self) -> Result<(), RelayError> {
        while self.deferred.is_none() {
            let Some(line) = self.input.try_receive() else {
                break;
            };
            let mouse = match parse_command(&line, self.grammar) {
                Ok(Command::Mouse(action)) => Some(action),
                _ => None,
            };
            match mouse {
                Some(action) => self.perform(action.into()).await?,
                // Everything else, unrecognized lines included, is
                // dispatched in arrival order once typing finishes
                None => self.deferred = Some(line),
            }
        }
        Ok(())
    }

    async fn perform(&mut self, action: HidAction) -> Result<(), RelayError> {
        match action {
            HidAction::Move { dx, dy } => {
                self.output.send_mouse(&MouseReport::movement(dx, dy)).await?;
            }
            HidAction::Click(button) => {
                self.output.send_mouse(&MouseReport::pressed(button)).await?;
                self.output.send_mouse(&MouseReport::idle()).await?;
            }
            HidAction::Keystroke(stroke) => {
                self.output
                    .send_keyboard(&KeyboardReport::from(stroke))
                    .await?;
                self.output
                    .send_keyboard(&KeyboardReport::released())
                    .await?;
            }
        }
        Ok(())
    }

    /// Grammar this relay parses.
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Returns `true` if a keyboard command is waiting for typing to finish.
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Get a reference to the input source.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Get a mutable reference to the input source.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Get a reference to the output sink.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the output sink.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Decompose the relay into its input, output and delay components.
    ///
    /// A deferred line, if any, is dropped.
    pub fn into_parts(self) -> (I, O, D) {
        (self.input, self.output, self.delay)
    }
}

/// Error type for relay operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError {
    /// Error from the input source.
    Input(InputError),
    /// Error from the output sink.
    Output(OutputError),
}

impl From<OutputError> for RelayError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}
