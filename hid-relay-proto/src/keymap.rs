//! Character and named-key to HID keystroke mapping (US layout).

use core::ops::{BitOr, BitOrAssign};

use crate::types::NamedKey;

/// Keyboard modifier byte of a boot-protocol keyboard report.
///
/// # Example
///
/// ```
/// use hid_relay_proto::Modifiers;
///
/// let mods = Modifiers::LEFT_CTRL | Modifiers::LEFT_ALT;
/// assert!(mods.contains(Modifiers::LEFT_ALT));
/// assert!(!mods.contains(Modifiers::LEFT_SHIFT));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const LEFT_CTRL: Self = Self(1 << 0);
    pub const LEFT_SHIFT: Self = Self(1 << 1);
    pub const LEFT_ALT: Self = Self(1 << 2);
    pub const LEFT_GUI: Self = Self(1 << 3); // Windows/Command
    pub const RIGHT_CTRL: Self = Self(1 << 4);
    pub const RIGHT_SHIFT: Self = Self(1 << 5);
    pub const RIGHT_ALT: Self = Self(1 << 6);
    pub const RIGHT_GUI: Self = Self(1 << 7);

    /// No modifiers held.
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// HID keyboard usage ID (usage page 0x07).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const A: Self = Self(0x04);
    pub const Z: Self = Self(0x1D);
    pub const ONE: Self = Self(0x1E);
    pub const TWO: Self = Self(0x1F);
    pub const THREE: Self = Self(0x20);
    pub const FOUR: Self = Self(0x21);
    pub const ZERO: Self = Self(0x27);
    pub const ENTER: Self = Self(0x28);
    pub const BACKSPACE: Self = Self(0x2A);
    pub const SPACE: Self = Self(0x2C);
    pub const MINUS: Self = Self(0x2D);
    pub const COMMA: Self = Self(0x36);
    pub const PERIOD: Self = Self(0x37);
    pub const FORWARD_SLASH: Self = Self(0x38);
    pub const DELETE: Self = Self(0x4C);

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Digit keys indexed by numeric value.
const DIGIT_KEYS: [KeyCode; 10] = [
    KeyCode::ZERO,
    KeyCode::ONE,
    KeyCode::TWO,
    KeyCode::THREE,
    KeyCode::FOUR,
    KeyCode(0x22),
    KeyCode(0x23),
    KeyCode(0x24),
    KeyCode(0x25),
    KeyCode(0x26),
];

/// One press-then-release-all chord.
///
/// `key` is `None` for modifier-only taps such as a bare shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Keystroke {
    pub modifiers: Modifiers,
    pub key: Option<KeyCode>,
}

impl Keystroke {
    #[must_use]
    pub const fn key(key: KeyCode) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            key: Some(key),
        }
    }

    #[must_use]
    pub const fn shifted(key: KeyCode) -> Self {
        Self {
            modifiers: Modifiers::LEFT_SHIFT,
            key: Some(key),
        }
    }

    #[must_use]
    pub const fn chord(modifiers: Modifiers, key: KeyCode) -> Self {
        Self {
            modifiers,
            key: Some(key),
        }
    }

    #[must_use]
    pub const fn modifier_only(modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            key: None,
        }
    }
}

/// Keystroke that types `byte`, or `None` if the byte is not in the
/// supported character set.
///
/// # Example
///
/// ```
/// use hid_relay_proto::{keystroke_for_char, KeyCode, Keystroke};
///
/// assert_eq!(keystroke_for_char(b'a'), Some(Keystroke::key(KeyCode::A)));
/// assert_eq!(keystroke_for_char(b'!'), Some(Keystroke::shifted(KeyCode::ONE)));
/// assert_eq!(keystroke_for_char(b'~'), None);
/// ```
#[must_use]
pub fn keystroke_for_char(byte: u8) -> Option<Keystroke> {
    let stroke = match byte {
        b'a'..=b'z' => Keystroke::key(KeyCode(KeyCode::A.0 + (byte - b'a'))),
        b'A'..=b'Z' => Keystroke::shifted(KeyCode(KeyCode::A.0 + (byte - b'A'))),
        b'0'..=b'9' => Keystroke::key(DIGIT_KEYS[usize::from(byte - b'0')]),
        b' ' => Keystroke::key(KeyCode::SPACE),
        b'\n' => Keystroke::key(KeyCode::ENTER),
        b'.' => Keystroke::key(KeyCode::PERIOD),
        b',' => Keystroke::key(KeyCode::COMMA),
        b'-' => Keystroke::key(KeyCode::MINUS),
        b'!' => Keystroke::shifted(KeyCode::ONE),
        b'?' => Keystroke::shifted(KeyCode::FORWARD_SLASH),
        b'_' => Keystroke::shifted(KeyCode::MINUS),
        b'@' => Keystroke::shifted(KeyCode::TWO),
        b'#' => Keystroke::shifted(KeyCode::THREE),
        b'$' => Keystroke::shifted(KeyCode::FOUR),
        _ => return None,
    };
    Some(stroke)
}

impl NamedKey {
    /// The chord this key sends.
    #[must_use]
    pub const fn keystroke(self) -> Keystroke {
        match self {
            Self::Shift => Keystroke::modifier_only(Modifiers::RIGHT_SHIFT),
            Self::LeftShift => Keystroke::modifier_only(Modifiers::LEFT_SHIFT),
            Self::Backspace => Keystroke::key(KeyCode::BACKSPACE),
            Self::Enter => Keystroke::key(KeyCode::ENTER),
            Self::CtrlAltDel => Keystroke::chord(
                Modifiers(Modifiers::LEFT_CTRL.0 | Modifiers::LEFT_ALT.0),
                KeyCode::DELETE,
            ),
            Self::Win3 => Keystroke::chord(Modifiers::LEFT_GUI, KeyCode::THREE),
        }
    }
}
