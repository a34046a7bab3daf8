//! Boot-protocol keyboard and mouse reports.

use hid_relay_proto::{Keystroke, MouseButton};

/// Size of a boot keyboard report in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Size of a mouse report (buttons, x, y, wheel) in bytes.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Boot-protocol keyboard input report.
///
/// Layout: modifier byte, reserved byte, six key slots.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte, always 0.
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// All keys released.
    #[must_use]
    pub const fn released() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Returns `true` if no key or modifier is held.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        self.serialize(&mut buf);
        buf
    }

    /// Serialise into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }
}

impl From<Keystroke> for KeyboardReport {
    fn from(stroke: Keystroke) -> Self {
        let mut report = Self::released();
        report.modifier = stroke.modifiers.raw();
        if let Some(key) = stroke.key {
            report.keycodes[0] = key.raw();
        }
        report
    }
}

/// Relative mouse input report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right).
    pub buttons: u8,
    /// Relative X movement.
    pub x: i8,
    /// Relative Y movement, positive is down.
    pub y: i8,
    /// Scroll wheel delta.
    pub wheel: i8,
}

impl MouseReport {
    /// No buttons, no movement.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            buttons: 0,
            x: 0,
            y: 0,
            wheel: 0,
        }
    }

    /// Relative move with no buttons held.
    #[must_use]
    pub const fn movement(x: i8, y: i8) -> Self {
        Self {
            buttons: 0,
            x,
            y,
            wheel: 0,
        }
    }

    /// Button held, no movement.
    #[must_use]
    pub const fn pressed(button: MouseButton) -> Self {
        Self {
            buttons: button.mask(),
            x: 0,
            y: 0,
            wheel: 0,
        }
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; MOUSE_REPORT_SIZE] {
        let mut buf = [0u8; MOUSE_REPORT_SIZE];
        self.serialize(&mut buf);
        buf
    }

    /// Serialise into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MOUSE_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.buttons;
        buf[1] = self.x as u8;
        buf[2] = self.y as u8;
        buf[3] = self.wheel as u8;
        MOUSE_REPORT_SIZE
    }
}
