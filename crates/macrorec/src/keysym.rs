//! Key symbols as they appear in macro files.
//!
//! A printable key is stored as its single character; every other key is
//! stored under a symbolic name (`f8`, `shift_r`, `enter`, ...). Names that
//! are not recognized decode to [`KeySym::Literal`] and are typed as text on
//! replay instead of being rejected.
//!
//! Only symbols that read back as themselves can be stored: a `Literal`
//! spelled like a character or key name, or a function key outside `F1` to
//! `F20`, fails to serialize.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};

/// A non-printable key with a symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    /// Either Alt key.
    Alt,
    /// Left Alt.
    AltLeft,
    /// Right Alt.
    AltRight,
    /// AltGr.
    AltGr,
    /// Backspace.
    Backspace,
    /// Caps Lock.
    CapsLock,
    /// Command / Windows / Super key.
    Cmd,
    /// Left Command key.
    CmdLeft,
    /// Right Command key.
    CmdRight,
    /// Either Control key.
    Ctrl,
    /// Left Control.
    CtrlLeft,
    /// Right Control.
    CtrlRight,
    /// Delete.
    Delete,
    /// Down arrow.
    Down,
    /// End.
    End,
    /// Enter / Return.
    Enter,
    /// Escape.
    Esc,
    /// Function key `F1` through `F20`.
    Function(u8),
    /// Home.
    Home,
    /// Insert.
    Insert,
    /// Left arrow.
    Left,
    /// Context menu key.
    Menu,
    /// Num Lock.
    NumLock,
    /// Page Down.
    PageDown,
    /// Page Up.
    PageUp,
    /// Pause / Break.
    Pause,
    /// Print Screen.
    PrintScreen,
    /// Right arrow.
    Right,
    /// Scroll Lock.
    ScrollLock,
    /// Either Shift key.
    Shift,
    /// Left Shift.
    ShiftLeft,
    /// Right Shift.
    ShiftRight,
    /// Space bar.
    Space,
    /// Tab.
    Tab,
    /// Up arrow.
    Up,
    /// Media play/pause.
    MediaPlayPause,
    /// Media mute.
    MediaVolumeMute,
    /// Media volume down.
    MediaVolumeDown,
    /// Media volume up.
    MediaVolumeUp,
    /// Media previous track.
    MediaPrevious,
    /// Media next track.
    MediaNext,
}

/// Highest function key number that has a name.
const MAX_FUNCTION_KEY: u8 = 20;

const NAMES: &[(NamedKey, &str)] = &[
    (NamedKey::Alt, "alt"),
    (NamedKey::AltLeft, "alt_l"),
    (NamedKey::AltRight, "alt_r"),
    (NamedKey::AltGr, "alt_gr"),
    (NamedKey::Backspace, "backspace"),
    (NamedKey::CapsLock, "caps_lock"),
    (NamedKey::Cmd, "cmd"),
    (NamedKey::CmdLeft, "cmd_l"),
    (NamedKey::CmdRight, "cmd_r"),
    (NamedKey::Ctrl, "ctrl"),
    (NamedKey::CtrlLeft, "ctrl_l"),
    (NamedKey::CtrlRight, "ctrl_r"),
    (NamedKey::Delete, "delete"),
    (NamedKey::Down, "down"),
    (NamedKey::End, "end"),
    (NamedKey::Enter, "enter"),
    (NamedKey::Esc, "esc"),
    (NamedKey::Home, "home"),
    (NamedKey::Insert, "insert"),
    (NamedKey::Left, "left"),
    (NamedKey::Menu, "menu"),
    (NamedKey::NumLock, "num_lock"),
    (NamedKey::PageDown, "page_down"),
    (NamedKey::PageUp, "page_up"),
    (NamedKey::Pause, "pause"),
    (NamedKey::PrintScreen, "print_screen"),
    (NamedKey::Right, "right"),
    (NamedKey::ScrollLock, "scroll_lock"),
    (NamedKey::Shift, "shift"),
    (NamedKey::ShiftLeft, "shift_l"),
    (NamedKey::ShiftRight, "shift_r"),
    (NamedKey::Space, "space"),
    (NamedKey::Tab, "tab"),
    (NamedKey::Up, "up"),
    (NamedKey::MediaPlayPause, "media_play_pause"),
    (NamedKey::MediaVolumeMute, "media_volume_mute"),
    (NamedKey::MediaVolumeDown, "media_volume_down"),
    (NamedKey::MediaVolumeUp, "media_volume_up"),
    (NamedKey::MediaPrevious, "media_previous"),
    (NamedKey::MediaNext, "media_next"),
];

impl NamedKey {
    /// Look up a key by its symbolic name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some((key, _)) = NAMES.iter().find(|(_, n)| *n == name) {
            return Some(*key);
        }
        name.strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=MAX_FUNCTION_KEY).contains(n))
            .map(Self::Function)
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Function(n) = self {
            return write!(f, "f{n}");
        }
        let name = NAMES
            .iter()
            .find(|(key, _)| key == self)
            .map_or("unknown", |(_, name)| name);
        f.write_str(name)
    }
}

/// A key as recorded in an action log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum KeySym {
    /// A non-printable key such as a function or modifier key.
    Named(NamedKey),
    /// A single printable character.
    Char(char),
    /// An unrecognized symbol, typed as literal text on replay.
    Literal(String),
}

impl KeySym {
    /// Decode a stored key symbol. Never fails: unknown names become
    /// [`KeySym::Literal`].
    #[must_use]
    pub fn decode(symbol: &str) -> Self {
        let mut chars = symbol.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::Char(c);
        }
        NamedKey::from_name(symbol).map_or_else(|| Self::Literal(symbol.to_string()), Self::Named)
    }

    /// Encode this key symbol for storage.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Check if this symbol decodes back to itself once stored.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        Self::decode(&self.encode()) == *self
    }

    /// Check if this symbol is the given named key.
    #[must_use]
    pub fn is(&self, key: NamedKey) -> bool {
        matches!(self, Self::Named(k) if *k == key)
    }

    /// Check if this symbol is a literal fallback rather than a real key.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for KeySym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(key) => key.fmt(f),
            Self::Char(c) => write!(f, "{c}"),
            Self::Literal(text) => f.write_str(text),
        }
    }
}

impl Serialize for KeySym {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.encode();
        let read_back = Self::decode(&text);
        if read_back != *self {
            return Err(S::Error::custom(format!(
                "key symbol {self:?} cannot be stored: it would read back as {read_back:?}"
            )));
        }
        serializer.serialize_str(&text)
    }
}

impl FromStr for KeySym {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}

impl From<String> for KeySym {
    fn from(symbol: String) -> Self {
        Self::decode(&symbol)
    }
}

impl From<KeySym> for String {
    fn from(key: KeySym) -> Self {
        key.encode()
    }
}

impl From<NamedKey> for KeySym {
    fn from(key: NamedKey) -> Self {
        Self::Named(key)
    }
}

impl From<char> for KeySym {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}
