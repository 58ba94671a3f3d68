//! Hotkey values.
//!
//! A [`Hotkey`] is a set of modifiers plus exactly one key. Parsing is
//! case-insensitive and accepts common aliases, so `ctrl+f1` and
//! `LeftControl+F1` name the same hotkey.

use std::fmt;
use std::str::FromStr;

use super::HotkeyError;

/// Modifier bit set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CONTROL: Modifiers = Modifiers(1);
    pub const SHIFT: Modifiers = Modifiers(1 << 1);
    pub const ALT: Modifiers = Modifiers(1 << 2);
    pub const SUPER: Modifiers = Modifiers(1 << 3);

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn from_name(name: &str) -> Option<Modifiers> {
        match name {
            "ctrl" | "control" | "leftcontrol" | "rightcontrol" | "lctrl" | "rctrl" => {
                Some(Modifiers::CONTROL)
            }
            "shift" | "leftshift" | "rightshift" | "lshift" | "rshift" => Some(Modifiers::SHIFT),
            "alt" | "leftalt" | "rightalt" | "lalt" | "ralt" | "option" => Some(Modifiers::ALT),
            "super" | "meta" | "command" | "cmd" | "win" | "windows" => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// Keys that have a name rather than a printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Minus,
    Equals,
    Comma,
    Period,
    Slash,
    Backslash,
    Semicolon,
    Quote,
    Backquote,
    LeftBracket,
    RightBracket,
}

impl NamedKey {
    fn from_name(name: &str) -> Option<NamedKey> {
        let key = match name {
            "space" => NamedKey::Space,
            "enter" | "return" => NamedKey::Enter,
            "escape" | "esc" => NamedKey::Escape,
            "tab" => NamedKey::Tab,
            "backspace" => NamedKey::Backspace,
            "delete" | "del" => NamedKey::Delete,
            "insert" | "ins" => NamedKey::Insert,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" | "pgup" => NamedKey::PageUp,
            "pagedown" | "pgdn" => NamedKey::PageDown,
            "up" | "uparrow" => NamedKey::Up,
            "down" | "downarrow" => NamedKey::Down,
            "left" | "leftarrow" => NamedKey::Left,
            "right" | "rightarrow" => NamedKey::Right,
            "minus" => NamedKey::Minus,
            "equals" => NamedKey::Equals,
            "comma" => NamedKey::Comma,
            "period" => NamedKey::Period,
            "slash" => NamedKey::Slash,
            "backslash" => NamedKey::Backslash,
            "semicolon" => NamedKey::Semicolon,
            "quote" => NamedKey::Quote,
            "backquote" => NamedKey::Backquote,
            "leftbracket" => NamedKey::LeftBracket,
            "rightbracket" => NamedKey::RightBracket,
            _ => return None,
        };
        Some(key)
    }
}

/// The non-modifier part of a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// `A`-`Z` or `0`-`9`, stored uppercase
    Char(char),
    /// `F1`-`F24`
    Function(u8),
    Named(NamedKey),
}

impl Key {
    fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Some(Key::Char(c.to_ascii_uppercase()));
            }
        }

        // Unity-style digit names: "alpha1", "keypad1" are treated as the digit
        for prefix in ["alpha", "digit", "keypad"] {
            if let Some(rest) = name.strip_prefix(prefix) {
                let mut digits = rest.chars();
                if let (Some(d), None) = (digits.next(), digits.next()) {
                    if d.is_ascii_digit() {
                        return Some(Key::Char(d));
                    }
                }
            }
        }

        if let Some(number) = name.strip_prefix('f') {
            if let Ok(n) = number.parse::<u8>() {
                if (1..=24).contains(&n) {
                    return Some(Key::Function(n));
                }
            }
        }

        NamedKey::from_name(name).map(Key::Named)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Function(n) => write!(f, "F{n}"),
            Key::Named(named) => write!(f, "{named:?}"),
        }
    }
}

/// A physical key combination.
///
/// Equality, hashing and ordering are structural: two values are equal iff
/// they have the same modifiers and the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hotkey {
    modifiers: Modifiers,
    key: Key,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse a `+`-separated chord such as `Ctrl+Shift+F1`.
    pub fn parse(input: &str) -> Result<Self, HotkeyError> {
        let invalid = |reason: &str| HotkeyError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut modifiers = Modifiers::NONE;
        let mut key = None;

        for part in input.split('+') {
            let name = part.trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(invalid("empty segment"));
            }

            if let Some(modifier) = Modifiers::from_name(&name) {
                modifiers |= modifier;
                continue;
            }

            let parsed = Key::from_name(&name)
                .ok_or_else(|| invalid(&format!("unknown key '{}'", part.trim())))?;
            if key.replace(parsed).is_some() {
                return Err(invalid("more than one non-modifier key"));
            }
        }

        let key = key.ok_or_else(|| invalid("no key given"))?;
        Ok(Self { modifiers, key })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Whether the host reports this hotkey as pressed on the current tick.
    pub fn is_pressed(&self, input: &dyn super::InputSource) -> bool {
        input.is_pressed(self)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SUPER, "Super"),
        ];
        for (modifier, name) in names {
            if self.modifiers.contains(modifier) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_function_key() {
        let hotkey = Hotkey::parse("F1").unwrap();
        assert!(hotkey.modifiers().is_empty());
        assert_eq!(hotkey.key(), Key::Function(1));
    }

    #[test]
    fn test_aliases_are_structurally_equal() {
        let a = Hotkey::parse("LeftControl+F1").unwrap();
        let b = Hotkey::parse("ctrl + f1").unwrap();
        let c = Hotkey::parse("F1+Control").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_modifiers_distinguish_hotkeys() {
        let plain = Hotkey::parse("F1").unwrap();
        let shifted = Hotkey::parse("Shift+F1").unwrap();
        assert_ne!(plain, shifted);
    }

    #[test]
    fn test_display_is_canonical() {
        let hotkey = Hotkey::parse("alt+shift+ctrl+q").unwrap();
        assert_eq!(hotkey.to_string(), "Ctrl+Shift+Alt+Q");

        let named = Hotkey::parse("cmd+Return").unwrap();
        assert_eq!(named.to_string(), "Super+Enter");

        let reparsed: Hotkey = hotkey.to_string().parse().unwrap();
        assert_eq!(reparsed, hotkey);
    }

    #[test]
    fn test_unity_digit_names() {
        assert_eq!(Hotkey::parse("Alpha1").unwrap(), Hotkey::parse("1").unwrap());
        assert_eq!(Hotkey::parse("Keypad5").unwrap().key(), Key::Char('5'));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Hotkey::parse("").is_err());
        assert!(Hotkey::parse("Ctrl+").is_err());
        assert!(Hotkey::parse("Ctrl+Shift").is_err());
        assert!(Hotkey::parse("A+B").is_err());
        assert!(Hotkey::parse("F25").is_err());
        assert!(Hotkey::parse("Hyper+A").is_err());
    }
}
