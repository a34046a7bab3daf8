//! Command line grammar shared by the HID relay host bridge and firmware.
//!
//! - **Types**: [`Grammar`], [`MouseAction`], [`NamedKey`], [`Command`]
//! - **Parsing**: [`parse_command()`] classifies one received line
//! - **Key mapping**: [`keystroke_for_char()`] and [`NamedKey::keystroke()`]
//!   turn commands into HID [`Keystroke`]s
//! - **Device limits**: [`MAX_BURST_LINES`] and [`playback_time_ms()`] tell
//!   the host how much the device can take at once
//! - **Encoding**: [`write_mouse_line()`], [`write_key_line()`] and
//!   [`write_text_lines()`] build lines on the host
//!
//! # Protocol Format
//!
//! Newline-terminated, case-sensitive ASCII lines. A trailing `\r` is
//! tolerated.
//!
//! ```text
//! up | down | left | right | left_click | right_click
//! CMD:<NAME>        NAME = SHIFT | BACKSPACE | ENTER | CTRL_ALT_DEL | WIN_3
//! TEXT:<payload>
//! ```
//!
//! The legacy grammar replaces `left_click` with `click`, has no
//! `right_click` or `CMD:`, adds a bare `shift`, and uses `type:` for text.
//!
//! Lines that match nothing are ignored by the receiver; there is no reply
//! channel.
//!
//! # Example
//!
//! ```
//! use hid_relay_proto::{parse_command, keystroke_for_char, Command, Grammar};
//!
//! if let Ok(Command::Text(payload)) = parse_command(b"TEXT:Hi!\n", Grammar::Current) {
//!     let strokes = payload.iter().filter_map(|&b| keystroke_for_char(b)).count();
//!     assert_eq!(strokes, 3);
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (host side and testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod encode;
pub mod keymap;
pub mod parser;
pub mod types;

pub use device::{
    keystroke_count, playback_time_ms, KEYSTROKE_INTERVAL_MS, KEYSTROKE_PERIOD_MS,
    LINE_QUEUE_DEPTH, MAX_BURST_LINES,
};
pub use encode::{max_text_chunk, write_key_line, write_mouse_line, write_text_lines, EncodeError};
pub use keymap::{keystroke_for_char, KeyCode, Keystroke, Modifiers};
pub use parser::{parse_command, ParseError, MAX_LINE_LENGTH};
pub use types::{Command, Grammar, MouseAction, MouseButton, NamedKey, KEY_PREFIX};
