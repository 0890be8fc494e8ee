//! Per-key edge detection
//!
//! Platform key repeat delivers a stream of press events while a key is held.
//! Overlay actions must fire once per physical press, so each overlay keeps a
//! [`KeyDebouncer`] and only acts on [`KeyClass::FreshPress`].

use crate::input::KeyCode;

/// Size of the tracked key-code space; codes at or above this are ignored
pub const KEY_CODE_LIMIT: usize = 1024;

/// Classification of a single key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Press of a key that was not held
    FreshPress,
    /// Press of a key that was already held (auto-repeat)
    Repeat,
    Release,
    /// Code outside `0..KEY_CODE_LIMIT`; never triggers anything
    OutOfRange,
}

/// Last-known pressed state for every key code
pub struct KeyDebouncer {
    held: Box<[bool]>,
}

impl KeyDebouncer {
    pub fn new() -> Self {
        Self {
            held: vec![false; KEY_CODE_LIMIT].into_boxed_slice(),
        }
    }

    /// Classify an event and record the key's new state.
    pub fn classify(&mut self, code: KeyCode, pressed: bool) -> KeyClass {
        let Some(slot) = usize::try_from(code)
            .ok()
            .and_then(|idx| self.held.get_mut(idx))
        else {
            return KeyClass::OutOfRange;
        };

        let class = match (pressed, *slot) {
            (true, false) => KeyClass::FreshPress,
            (true, true) => KeyClass::Repeat,
            (false, _) => KeyClass::Release,
        };
        *slot = pressed;
        class
    }

    /// Whether `code` is currently recorded as held
    pub fn is_held(&self, code: KeyCode) -> bool {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.held.get(idx))
            .copied()
            .unwrap_or(false)
    }

    /// Forget all held keys. Called when an overlay becomes active so keys held
    /// beforehand cannot fire actions.
    pub fn reset(&mut self) {
        self.held.fill(false);
    }
}

impl Default for KeyDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
