//! HID actions produced by dispatching a command.

use hid_relay_proto::{Keystroke, MouseAction, MouseButton, NamedKey};

pub use hid_relay_proto::KEYSTROKE_INTERVAL_MS;

/// Pointer travel per directional command, in HID counts.
pub const MOVE_STEP: i8 = 10;

/// A single HID effect.
///
/// Clicks and keystrokes always expand to a press report followed by a
/// release report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidAction {
    Move { dx: i8, dy: i8 },
    Click(MouseButton),
    Keystroke(Keystroke),
}

impl From<MouseAction> for HidAction {
    fn from(action: MouseAction) -> Self {
        match action {
            MouseAction::Up => Self::Move {
                dx: 0,
                dy: -MOVE_STEP,
            },
            MouseAction::Down => Self::Move {
                dx: 0,
                dy: MOVE_STEP,
            },
            MouseAction::Left => Self::Move {
                dx: -MOVE_STEP,
                dy: 0,
            },
            MouseAction::Right => Self::Move {
                dx: MOVE_STEP,
                dy: 0,
            },
            MouseAction::LeftClick => Self::Click(MouseButton::Left),
            MouseAction::RightClick => Self::Click(MouseButton::Right),
        }
    }
}

impl From<NamedKey> for HidAction {
    fn from(key: NamedKey) -> Self {
        Self::Keystroke(key.keystroke())
    }
}
