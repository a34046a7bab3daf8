//! Receive limits and playback timing of the device.
//!
//! The device types slower than the UART delivers. The host uses these
//! numbers to keep a write within what the device can queue, and to wait
//! for playback to finish before sending more.

use crate::parser::parse_command;
use crate::types::{Command, Grammar};

/// Lines the device queues while it is busy with another one.
pub const LINE_QUEUE_DEPTH: usize = 8;

/// Most lines one write may carry: the line being played back plus a full
/// queue. Lines past this are dropped by the device.
pub const MAX_BURST_LINES: usize = LINE_QUEUE_DEPTH + 1;

/// Pause after each typed keystroke.
pub const KEYSTROKE_INTERVAL_MS: u32 = 50;

/// Time one keystroke occupies the device: the pause plus a press and a
/// release report at a 1 ms polling interval.
pub const KEYSTROKE_PERIOD_MS: u32 = KEYSTROKE_INTERVAL_MS + 2;

/// Keystrokes the device plays back for `lines`.
///
/// Each text byte and each named key counts as one. Mouse lines and lines
/// that are not commands count as none. Unsupported text bytes are counted
/// too, so the result is an upper bound.
#[must_use]
pub fn keystroke_count(lines: &str, grammar: Grammar) -> usize {
    lines
        .lines()
        .map(|line| match parse_command(line.as_bytes(), grammar) {
            Ok(Command::Text(payload)) => payload.len(),
            Ok(Command::Key(_)) => 1,
            Ok(Command::Mouse(_)) | Err(_) => 0,
        })
        .sum()
}

/// Upper bound on the time the device needs to play back `lines`.
#[must_use]
pub fn playback_time_ms(lines: &str, grammar: Grammar) -> u64 {
    keystroke_count(lines, grammar) as u64 * u64::from(KEYSTROKE_PERIOD_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_is_one_line_plus_queue() {
        assert_eq!(MAX_BURST_LINES, 9);
    }

    #[test]
    fn test_keystroke_count() {
        let lines = "up\nTEXT:Hi\nCMD:ENTER\nTEXT:yo \nleft_click\njunk\n";
        assert_eq!(keystroke_count(lines, Grammar::Current), 2 + 1 + 3);
        assert_eq!(keystroke_count("", Grammar::Current), 0);
    }

    #[test]
    fn test_legacy_keystroke_count() {
        assert_eq!(keystroke_count("shift\ntype:abc\nclick\n", Grammar::Legacy), 4);
        // Current-grammar lines mean nothing to a legacy device
        assert_eq!(keystroke_count("TEXT:abc\n", Grammar::Legacy), 0);
    }

    #[test]
    fn test_playback_time() {
        assert_eq!(playback_time_ms("up\n", Grammar::Current), 0);
        assert_eq!(
            playback_time_ms("TEXT:abcd\n", Grammar::Current),
            4 * u64::from(KEYSTROKE_PERIOD_MS)
        );
    }
}
