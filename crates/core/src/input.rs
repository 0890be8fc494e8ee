//! Raw key events as delivered by the platform event pump
//!
//! Key symbols follow the SDL 1.2 keysym numbering used by handheld builds,
//! where the d-pad and face buttons arrive as ordinary keyboard keys.

use serde::{Deserialize, Serialize};

/// Key symbol code
pub type KeyCode = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    Press,
    Release,
}

/// One key event: kind, symbol and hardware scancode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub sym: KeyCode,
    pub scancode: u16,
}

impl KeyEvent {
    pub fn press(sym: KeyCode) -> Self {
        Self {
            kind: KeyEventKind::Press,
            sym,
            scancode: 0,
        }
    }

    pub fn release(sym: KeyCode) -> Self {
        Self {
            kind: KeyEventKind::Release,
            sym,
            scancode: 0,
        }
    }

    /// Builder for events that carry a hardware scancode
    pub fn with_scancode(mut self, scancode: u16) -> Self {
        self.scancode = scancode;
        self
    }

    #[inline]
    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }
}

pub mod keys {
    //! Key symbol constants and name lookup

    use super::KeyCode;

    pub const BACKSPACE: KeyCode = 8;
    pub const TAB: KeyCode = 9;
    pub const ENTER: KeyCode = 13;
    pub const ESCAPE: KeyCode = 27;
    pub const SPACE: KeyCode = 32;
    pub const UP: KeyCode = 273;
    pub const DOWN: KeyCode = 274;
    pub const RIGHT: KeyCode = 275;
    pub const LEFT: KeyCode = 276;
    pub const HOME: KeyCode = 278;
    pub const END: KeyCode = 279;
    pub const PAGE_UP: KeyCode = 280;
    pub const PAGE_DOWN: KeyCode = 281;
    pub const RIGHT_SHIFT: KeyCode = 303;
    pub const LEFT_SHIFT: KeyCode = 304;
    pub const RIGHT_CTRL: KeyCode = 305;
    pub const LEFT_CTRL: KeyCode = 306;
    pub const RIGHT_ALT: KeyCode = 307;
    pub const LEFT_ALT: KeyCode = 308;

    const NAMED: &[(&str, KeyCode)] = &[
        ("Backspace", BACKSPACE),
        ("Tab", TAB),
        ("Enter", ENTER),
        ("Escape", ESCAPE),
        ("Space", SPACE),
        ("Up", UP),
        ("Down", DOWN),
        ("Right", RIGHT),
        ("Left", LEFT),
        ("Home", HOME),
        ("End", END),
        ("PageUp", PAGE_UP),
        ("PageDown", PAGE_DOWN),
        ("RightShift", RIGHT_SHIFT),
        ("LeftShift", LEFT_SHIFT),
        ("RightCtrl", RIGHT_CTRL),
        ("LeftCtrl", LEFT_CTRL),
        ("RightAlt", RIGHT_ALT),
        ("LeftAlt", LEFT_ALT),
    ];

    /// Resolve a key name ("Up", "LeftCtrl", "A", "7") to its symbol.
    /// Matching is case-insensitive.
    pub fn from_name(name: &str) -> Option<KeyCode> {
        if let Some(&(_, code)) = NAMED.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            return Some(code);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => {
                Some(c.to_ascii_lowercase() as KeyCode)
            }
            _ => None,
        }
    }

    /// Human-readable name for a symbol, if it has one
    pub fn name(code: KeyCode) -> Option<String> {
        if let Some(&(n, _)) = NAMED.iter().find(|(_, c)| *c == code) {
            return Some(n.to_string());
        }
        u8::try_from(code)
            .ok()
            .map(char::from)
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase().to_string())
    }
}
