//! Command vocabulary: grammars, mouse tokens, named keys and parsed commands.

/// Which command grammar a relay speaks.
///
/// The two grammars are not negotiated over the wire; both ends must be
/// built or configured for the same one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Grammar {
    /// `up`/`left_click`/`CMD:<NAME>`/`TEXT:<payload>`.
    #[default]
    Current,
    /// `up`/`click`/`shift`/`type:<payload>`.
    Legacy,
}

impl Grammar {
    /// Prefix that introduces a text payload.
    #[must_use]
    pub const fn text_prefix(self) -> &'static [u8] {
        match self {
            Self::Current => b"TEXT:",
            Self::Legacy => b"type:",
        }
    }
}

/// Prefix that introduces a named key in the current grammar.
pub const KEY_PREFIX: &[u8] = b"CMD:";

/// Discrete mouse action carried by a bare token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MouseAction {
    Up,
    Down,
    Left,
    Right,
    LeftClick,
    RightClick,
}

impl MouseAction {
    /// Every action, in token-table order.
    pub const ALL: [Self; 6] = [
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::LeftClick,
        Self::RightClick,
    ];

    /// Wire token for this action, or `None` if the grammar cannot express it.
    #[must_use]
    pub const fn token(self, grammar: Grammar) -> Option<&'static str> {
        match (self, grammar) {
            (Self::Up, _) => Some("up"),
            (Self::Down, _) => Some("down"),
            (Self::Left, _) => Some("left"),
            (Self::Right, _) => Some("right"),
            (Self::LeftClick, Grammar::Current) => Some("left_click"),
            (Self::LeftClick, Grammar::Legacy) => Some("click"),
            (Self::RightClick, Grammar::Current) => Some("right_click"),
            (Self::RightClick, Grammar::Legacy) => None,
        }
    }

    /// Look up an exact token.
    #[must_use]
    pub fn from_token(token: &[u8], grammar: Grammar) -> Option<Self> {
        Self::ALL.into_iter().find(|action| {
            action
                .token(grammar)
                .is_some_and(|t| t.as_bytes() == token)
        })
    }
}

/// Mouse button targeted by a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Bit in the boot-protocol mouse report button field.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            Self::Left => 0x01,
            Self::Right => 0x02,
        }
    }
}

/// Named keyboard action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NamedKey {
    /// `CMD:SHIFT`, taps right shift.
    Shift,
    /// Legacy bare `shift`, taps left shift.
    LeftShift,
    Backspace,
    Enter,
    CtrlAltDel,
    /// Windows+3, which launches the third taskbar entry.
    Win3,
}

impl NamedKey {
    /// Keys addressable with `CMD:<NAME>`.
    pub const NAMED: [Self; 5] = [
        Self::Shift,
        Self::Backspace,
        Self::Enter,
        Self::CtrlAltDel,
        Self::Win3,
    ];

    /// `CMD:` name of the key, if it has one.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Shift => Some("SHIFT"),
            Self::LeftShift => None,
            Self::Backspace => Some("BACKSPACE"),
            Self::Enter => Some("ENTER"),
            Self::CtrlAltDel => Some("CTRL_ALT_DEL"),
            Self::Win3 => Some("WIN_3"),
        }
    }

    /// Look up a `CMD:` name exactly.
    #[must_use]
    pub fn from_name(name: &[u8]) -> Option<Self> {
        Self::NAMED
            .into_iter()
            .find(|key| key.name().is_some_and(|n| n.as_bytes() == name))
    }
}

/// A classified command line.
///
/// Text payloads borrow from the line they were parsed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Command<'a> {
    Mouse(MouseAction),
    Key(NamedKey),
    Text(&'a [u8]),
}
