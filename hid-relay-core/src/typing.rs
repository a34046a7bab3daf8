//! Incremental text typing.

use heapless::Vec;
use hid_relay_proto::{keystroke_for_char, Keystroke, MAX_LINE_LENGTH};

/// Walks a text payload one keystroke at a time.
///
/// The cursor owns a copy of the payload so the line it came from can be
/// released while typing is in progress. Bytes outside the supported
/// character set are skipped and counted.
///
/// # Example
///
/// ```
/// use hid_relay_core::TextCursor;
///
/// let mut cursor = TextCursor::new(b"a~b");
/// assert_eq!(cursor.by_ref().count(), 2);
/// assert_eq!(cursor.skipped(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TextCursor {
    text: Vec<u8, MAX_LINE_LENGTH>,
    pos: usize,
    skipped: usize,
}

impl TextCursor {
    /// Start typing `payload`. Anything past [`MAX_LINE_LENGTH`] is dropped.
    #[must_use]
    pub fn new(payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_LINE_LENGTH);
        Self {
            text: Vec::from_slice(&payload[..len]).unwrap_or_default(),
            pos: 0,
            skipped: 0,
        }
    }

    /// Bytes skipped so far because they have no keystroke.
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns `true` once every byte has been consumed.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pos >= self.text.len()
    }
}

impl Iterator for TextCursor {
    type Item = Keystroke;

    fn next(&mut self) -> Option<Keystroke> {
        while let Some(&byte) = self.text.get(self.pos) {
            self.pos += 1;
            match keystroke_for_char(byte) {
                Some(stroke) => return Some(stroke),
                None => self.skipped += 1,
            }
        }
        None
    }
}
