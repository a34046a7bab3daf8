//! Command line classification.
//!
//! A line is classified in a fixed order:
//! 1. exact match against the bare mouse tokens (and legacy `shift`)
//! 2. prefix match against `CMD:` (current grammar only)
//! 3. prefix match against the grammar's text prefix (`TEXT:` or `type:`)
//!
//! Surrounding whitespace is ignored for classification. Text payloads keep
//! their trailing whitespace so chunked text types back exactly.

use crate::types::{Command, Grammar, MouseAction, NamedKey, KEY_PREFIX};

/// Maximum line length the device buffers, excluding the newline.
pub const MAX_LINE_LENGTH: usize = 256;

/// Reason a line was not dispatched.
///
/// None of these are reported back to the host; the relay treats them as
/// no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line was empty or whitespace only.
    Empty,
    /// Line matched no token or prefix.
    UnknownToken,
    /// `CMD:` with a name outside the named-key set.
    UnknownKey,
}

/// Classify a single command line.
///
/// # Example
///
/// ```
/// use hid_relay_proto::{parse_command, Command, Grammar, MouseAction};
///
/// assert_eq!(
///     parse_command(b"up\n", Grammar::Current),
///     Ok(Command::Mouse(MouseAction::Up))
/// );
/// assert_eq!(
///     parse_command(b"TEXT:Hi!\r\n", Grammar::Current),
///     Ok(Command::Text(b"Hi!"))
/// );
/// ```
pub fn parse_command(line: &[u8], grammar: Grammar) -> Result<Command<'_>, ParseError> {
    let line = trim_start(strip_line_ending(line));
    let trimmed = trim_end(line);

    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(action) = MouseAction::from_token(trimmed, grammar) {
        return Ok(Command::Mouse(action));
    }

    match grammar {
        Grammar::Current => {
            if let Some(rest) = trimmed.strip_prefix(KEY_PREFIX) {
                let name = rest.split(|&b| b == b':').next().unwrap_or_default();
                return NamedKey::from_name(name)
                    .map(Command::Key)
                    .ok_or(ParseError::UnknownKey);
            }
        }
        Grammar::Legacy => {
            if trimmed == b"shift" {
                return Ok(Command::Key(NamedKey::LeftShift));
            }
        }
    }

    line.strip_prefix(grammar.text_prefix())
        .map(Command::Text)
        .ok_or(ParseError::UnknownToken)
}

/// Strip a trailing LF and/or CR.
#[inline]
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}

#[inline]
fn trim_start(s: &[u8]) -> &[u8] {
    let start = s
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(s.len());
    &s[start..]
}

#[inline]
fn trim_end(s: &[u8]) -> &[u8] {
    let end = s
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directional_tokens() {
        assert_eq!(
            parse_command(b"up\n", Grammar::Current),
            Ok(Command::Mouse(MouseAction::Up))
        );
        assert_eq!(
            parse_command(b"down", Grammar::Current),
            Ok(Command::Mouse(MouseAction::Down))
        );
        assert_eq!(
            parse_command(b"right_click\r\n", Grammar::Current),
            Ok(Command::Mouse(MouseAction::RightClick))
        );
    }

    #[test]
    fn test_parse_tokens_are_case_sensitive() {
        assert_eq!(
            parse_command(b"UP", Grammar::Current),
            Err(ParseError::UnknownToken)
        );
        assert_eq!(
            parse_command(b"text:hi", Grammar::Current),
            Err(ParseError::UnknownToken)
        );
    }

    #[test]
    fn test_parse_surrounding_whitespace_ignored() {
        assert_eq!(
            parse_command(b"  left \t\n", Grammar::Current),
            Ok(Command::Mouse(MouseAction::Left))
        );
    }

    #[test]
    fn test_parse_cmd() {
        assert_eq!(
            parse_command(b"CMD:ENTER\n", Grammar::Current),
            Ok(Command::Key(NamedKey::Enter))
        );
        assert_eq!(
            parse_command(b"CMD:CTRL_ALT_DEL", Grammar::Current),
            Ok(Command::Key(NamedKey::CtrlAltDel))
        );
    }

    #[test]
    fn test_parse_cmd_name_ends_at_next_colon() {
        assert_eq!(
            parse_command(b"CMD:ENTER:extra", Grammar::Current),
            Ok(Command::Key(NamedKey::Enter))
        );
    }

    #[test]
    fn test_parse_cmd_unknown_name() {
        assert_eq!(
            parse_command(b"CMD:ESCAPE", Grammar::Current),
            Err(ParseError::UnknownKey)
        );
        assert_eq!(
            parse_command(b"CMD:", Grammar::Current),
            Err(ParseError::UnknownKey)
        );
    }

    #[test]
    fn test_parse_text_payload() {
        assert_eq!(
            parse_command(b"TEXT:Hi!\n", Grammar::Current),
            Ok(Command::Text(b"Hi!"))
        );
        assert_eq!(
            parse_command(b"TEXT:a:b:c", Grammar::Current),
            Ok(Command::Text(b"a:b:c"))
        );
        assert_eq!(
            parse_command(b"TEXT:", Grammar::Current),
            Ok(Command::Text(b""))
        );
    }

    #[test]
    fn test_parse_text_keeps_trailing_spaces() {
        assert_eq!(
            parse_command(b"TEXT:hello \n", Grammar::Current),
            Ok(Command::Text(b"hello "))
        );
    }

    #[test]
    fn test_parse_empty_lines() {
        assert_eq!(parse_command(b"", Grammar::Current), Err(ParseError::Empty));
        assert_eq!(parse_command(b"\n", Grammar::Current), Err(ParseError::Empty));
        assert_eq!(
            parse_command(b" \t \r\n", Grammar::Current),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_parse_unknown_line() {
        assert_eq!(
            parse_command(b"foobar\n", Grammar::Current),
            Err(ParseError::UnknownToken)
        );
    }

    #[test]
    fn test_parse_legacy_grammar() {
        assert_eq!(
            parse_command(b"click", Grammar::Legacy),
            Ok(Command::Mouse(MouseAction::LeftClick))
        );
        assert_eq!(
            parse_command(b"shift\n", Grammar::Legacy),
            Ok(Command::Key(NamedKey::LeftShift))
        );
        assert_eq!(
            parse_command(b"type:abc", Grammar::Legacy),
            Ok(Command::Text(b"abc"))
        );
    }

    #[test]
    fn test_grammars_do_not_mix() {
        assert_eq!(
            parse_command(b"CMD:ENTER", Grammar::Legacy),
            Err(ParseError::UnknownToken)
        );
        assert_eq!(
            parse_command(b"TEXT:abc", Grammar::Legacy),
            Err(ParseError::UnknownToken)
        );
        assert_eq!(
            parse_command(b"type:abc", Grammar::Current),
            Err(ParseError::UnknownToken)
        );
        assert_eq!(
            parse_command(b"shift", Grammar::Current),
            Err(ParseError::UnknownToken)
        );
    }
}
