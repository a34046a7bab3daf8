//! Host-side command line encoding.
//!
//! Every function writes complete `\n`-terminated lines to a
//! [`core::fmt::Write`] target and returns the number of lines written.
//! Nothing here validates mouse tokens or key names against the device
//! vocabulary; the device ignores what it does not recognize.
//!
//! # Example
//!
//! ```
//! use hid_relay_proto::{write_text_lines, Grammar};
//!
//! let mut out = String::new();
//! let lines = write_text_lines(&mut out, "hi\nthere", Grammar::Current).unwrap();
//! assert_eq!(lines, 3);
//! assert_eq!(out, "TEXT:hi\nCMD:ENTER\nTEXT:there\n");
//! ```

use core::fmt::Write;

use crate::parser::MAX_LINE_LENGTH;
use crate::types::{Grammar, NamedKey, KEY_PREFIX};

/// Error returned by the line encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// A token or key name contains `\r` or `\n`.
    LineTerminator,
    /// The grammar has no way to express the command.
    Unsupported,
    /// The underlying writer failed.
    WriteError,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LineTerminator => write!(f, "line terminator in command"),
            Self::Unsupported => write!(f, "command not supported by grammar"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

impl From<core::fmt::Error> for EncodeError {
    fn from(_: core::fmt::Error) -> Self {
        Self::WriteError
    }
}

#[inline]
fn has_line_terminator(s: &str) -> bool {
    s.bytes().any(|b| b == b'\n' || b == b'\r')
}

/// Write a bare mouse token line, e.g. `up\n`.
///
/// # Errors
///
/// [`EncodeError::LineTerminator`] if `token` would break the framing.
pub fn write_mouse_line<W: Write>(out: &mut W, token: &str) -> Result<usize, EncodeError> {
    if has_line_terminator(token) {
        return Err(EncodeError::LineTerminator);
    }
    out.write_str(token)?;
    out.write_char('\n')?;
    Ok(1)
}

/// Write a named key line.
///
/// The current grammar sends `CMD:<name>\n`. The legacy grammar only knows
/// left shift, which it spells `shift`.
///
/// # Errors
///
/// [`EncodeError::LineTerminator`] if `name` would break the framing, and
/// [`EncodeError::Unsupported`] for any legacy name other than `SHIFT`.
pub fn write_key_line<W: Write>(
    out: &mut W,
    name: &str,
    grammar: Grammar,
) -> Result<usize, EncodeError> {
    if has_line_terminator(name) {
        return Err(EncodeError::LineTerminator);
    }
    match grammar {
        Grammar::Current => {
            // KEY_PREFIX is ASCII
            for &b in KEY_PREFIX {
                out.write_char(char::from(b))?;
            }
            out.write_str(name)?;
        }
        Grammar::Legacy => {
            if NamedKey::from_name(name.as_bytes()) != Some(NamedKey::Shift) {
                return Err(EncodeError::Unsupported);
            }
            out.write_str("shift")?;
        }
    }
    out.write_char('\n')?;
    Ok(1)
}

/// Longest payload that fits one line after the grammar's text prefix.
#[must_use]
pub const fn max_text_chunk(grammar: Grammar) -> usize {
    MAX_LINE_LENGTH - grammar.text_prefix().len()
}

/// Write a text payload as one or more text lines.
///
/// `\r` is dropped. Each `\n` becomes a `CMD:ENTER` line in the current
/// grammar and is dropped in the legacy grammar. Segments longer than
/// [`max_text_chunk`] are split on character boundaries. Empty segments
/// produce no line, so empty text writes nothing.
///
/// # Errors
///
/// [`EncodeError::WriteError`] if the writer fails.
pub fn write_text_lines<W: Write>(
    out: &mut W,
    text: &str,
    grammar: Grammar,
) -> Result<usize, EncodeError> {
    let limit = max_text_chunk(grammar);
    let mut lines = 0;

    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 && grammar == Grammar::Current {
            lines += write_key_line(out, "ENTER", grammar)?;
        }

        let mut rest = segment;
        loop {
            let (chunk, len) = take_chunk(rest, limit);
            if len == 0 {
                break;
            }
            write_text_line(out, chunk, grammar)?;
            lines += 1;
            rest = &rest[chunk.len()..];
        }
    }

    Ok(lines)
}

/// Split off the longest prefix of `s` whose `\r`-free length fits `limit`.
///
/// Returns the prefix and its length with carriage returns excluded.
fn take_chunk(s: &str, limit: usize) -> (&str, usize) {
    let mut kept = 0;
    let mut end = 0;
    for (idx, ch) in s.char_indices() {
        if ch == '\r' {
            end = idx + 1;
            continue;
        }
        let width = ch.len_utf8();
        if kept + width > limit {
            break;
        }
        kept += width;
        end = idx + width;
    }
    (&s[..end], kept)
}

fn write_text_line<W: Write>(out: &mut W, chunk: &str, grammar: Grammar) -> Result<(), EncodeError> {
    for &b in grammar.text_prefix() {
        out.write_char(char::from(b))?;
    }
    for ch in chunk.chars().filter(|&c| c != '\r') {
        out.write_char(ch)?;
    }
    out.write_char('\n')?;
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::parser::parse_command;
    use crate::types::{Command, MouseAction};
    use std::string::String;
    use std::vec::Vec;

    fn encode_text(text: &str, grammar: Grammar) -> String {
        let mut out = String::new();
        write_text_lines(&mut out, text, grammar).unwrap();
        out
    }

    /// Replay encoded lines through the parser and rebuild what the device types.
    fn replay(encoded: &str, grammar: Grammar) -> Vec<u8> {
        let mut typed = Vec::new();
        for line in encoded.split_inclusive('\n') {
            assert!(line.len() - 1 <= MAX_LINE_LENGTH, "line too long: {}", line.len());
            match parse_command(line.as_bytes(), grammar).unwrap() {
                Command::Text(payload) => typed.extend_from_slice(payload),
                Command::Key(NamedKey::Enter) => typed.push(b'\n'),
                other => panic!("unexpected command {other:?}"),
            }
        }
        typed
    }

    #[test]
    fn test_mouse_line() {
        let mut out = String::new();
        assert_eq!(write_mouse_line(&mut out, "left_click"), Ok(1));
        assert_eq!(out, "left_click\n");
        assert_eq!(
            parse_command(out.as_bytes(), Grammar::Current),
            Ok(Command::Mouse(MouseAction::LeftClick))
        );
    }

    #[test]
    fn test_mouse_line_passes_unknown_tokens() {
        let mut out = String::new();
        write_mouse_line(&mut out, "jump").unwrap();
        assert_eq!(out, "jump\n");
    }

    #[test]
    fn test_mouse_line_rejects_terminators() {
        let mut out = String::new();
        assert_eq!(
            write_mouse_line(&mut out, "up\nCMD:ENTER"),
            Err(EncodeError::LineTerminator)
        );
        assert_eq!(write_mouse_line(&mut out, "up\r"), Err(EncodeError::LineTerminator));
        assert!(out.is_empty());
    }

    #[test]
    fn test_key_line_current() {
        let mut out = String::new();
        write_key_line(&mut out, "CTRL_ALT_DEL", Grammar::Current).unwrap();
        assert_eq!(out, "CMD:CTRL_ALT_DEL\n");
    }

    #[test]
    fn test_key_line_legacy() {
        let mut out = String::new();
        write_key_line(&mut out, "SHIFT", Grammar::Legacy).unwrap();
        assert_eq!(out, "shift\n");
        assert_eq!(
            parse_command(out.as_bytes(), Grammar::Legacy),
            Ok(Command::Key(NamedKey::LeftShift))
        );

        let mut out = String::new();
        assert_eq!(
            write_key_line(&mut out, "ENTER", Grammar::Legacy),
            Err(EncodeError::Unsupported)
        );
    }

    #[test]
    fn test_text_single_line() {
        assert_eq!(encode_text("Hi!", Grammar::Current), "TEXT:Hi!\n");
        assert_eq!(encode_text("Hi!", Grammar::Legacy), "type:Hi!\n");
    }

    #[test]
    fn test_text_newlines_current() {
        assert_eq!(
            encode_text("a\r\nb\n", Grammar::Current),
            "TEXT:a\nCMD:ENTER\nTEXT:b\nCMD:ENTER\n"
        );
        assert_eq!(replay(&encode_text("a\r\nb\n", Grammar::Current), Grammar::Current), b"a\nb\n");
    }

    #[test]
    fn test_text_newlines_legacy_dropped() {
        let encoded = encode_text("one\ntwo", Grammar::Legacy);
        assert_eq!(encoded, "type:one\ntype:two\n");
        assert_eq!(replay(&encoded, Grammar::Legacy), b"onetwo");
    }

    #[test]
    fn test_text_empty_writes_nothing() {
        let mut out = String::new();
        assert_eq!(write_text_lines(&mut out, "", Grammar::Current), Ok(0));
        assert!(out.is_empty());
    }

    #[test]
    fn test_text_long_payload_is_chunked() {
        let text: String = "abc def ".repeat(100);
        let encoded = encode_text(&text, Grammar::Current);
        assert!(encoded.lines().count() > 1);
        assert_eq!(replay(&encoded, Grammar::Current), text.as_bytes());
    }

    #[test]
    fn test_text_chunks_on_char_boundaries() {
        let text: String = "é".repeat(300);
        let encoded = encode_text(&text, Grammar::Current);
        for line in encoded.lines() {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert_eq!(replay(&encoded, Grammar::Current), text.as_bytes());
    }

    #[test]
    fn test_text_chunk_exactly_at_limit() {
        let text: String = "x".repeat(max_text_chunk(Grammar::Current));
        let encoded = encode_text(&text, Grammar::Current);
        assert_eq!(encoded.lines().count(), 1);
        assert_eq!(encoded.len(), MAX_LINE_LENGTH + 1);
    }
}
