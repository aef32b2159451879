//! Key translation tables.
//!
//! Characters and named keys are translated to the native key identifiers at
//! the backend boundary:
//!
//! ```text
//! char / Key → X11 KeySym  → XKeysymToKeycode → keycode   (X11)
//! char / Key → Windows VK  → WM_KEYDOWN / WM_KEYUP        (Win32)
//! char       → UTF-16 unit → WM_CHAR                      (Win32, no VK)
//! ```

pub mod windows_vk;
pub mod x11_keysym;

use std::str::FromStr;

use crate::error::DsiError;

/// Named keys that have no (or no unambiguous) printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Tab,
    Backspace,
    Escape,
    Space,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowUp,
    ArrowRight,
    ArrowDown,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl Key {
    /// Every key, in declaration order.
    pub const ALL: [Key; 27] = [
        Key::Enter,
        Key::Tab,
        Key::Backspace,
        Key::Escape,
        Key::Space,
        Key::Insert,
        Key::Delete,
        Key::Home,
        Key::End,
        Key::PageUp,
        Key::PageDown,
        Key::ArrowLeft,
        Key::ArrowUp,
        Key::ArrowRight,
        Key::ArrowDown,
        Key::F1,
        Key::F2,
        Key::F3,
        Key::F4,
        Key::F5,
        Key::F6,
        Key::F7,
        Key::F8,
        Key::F9,
        Key::F10,
        Key::F11,
        Key::F12,
    ];
}

impl FromStr for Key {
    type Err = DsiError;

    /// Accepts both DOM-style names (`ArrowUp`, `PageDown`) and the X11
    /// keysym names (`Up`, `Next`, `Return`, `BackSpace`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "Enter" | "Return" => Key::Enter,
            "Tab" => Key::Tab,
            "Backspace" | "BackSpace" => Key::Backspace,
            "Escape" | "Esc" => Key::Escape,
            "Space" | "space" => Key::Space,
            "Insert" => Key::Insert,
            "Delete" => Key::Delete,
            "Home" => Key::Home,
            "End" => Key::End,
            "PageUp" | "Prior" => Key::PageUp,
            "PageDown" | "Next" => Key::PageDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "F1" => Key::F1,
            "F2" => Key::F2,
            "F3" => Key::F3,
            "F4" => Key::F4,
            "F5" => Key::F5,
            "F6" => Key::F6,
            "F7" => Key::F7,
            "F8" => Key::F8,
            "F9" => Key::F9,
            "F10" => Key::F10,
            "F11" => Key::F11,
            "F12" => Key::F12,
            _ => return Err(DsiError::UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a character to an X11 KeySym.
    ///
    /// Returns `None` for control characters without a key.
    pub fn char_to_x11_keysym(ch: char) -> Option<u32> {
        x11_keysym::char_to_keysym(ch)
    }

    /// Translates a named key to an X11 KeySym.
    pub fn key_to_x11_keysym(key: Key) -> u32 {
        x11_keysym::key_to_keysym(key)
    }

    /// Translates a character to a Windows virtual key code.
    ///
    /// Only characters that correspond to a dedicated key (Enter, Tab,
    /// Backspace, Escape) have one; everything else is delivered as
    /// `WM_CHAR`.
    pub fn char_to_windows_vk(ch: char) -> Option<u8> {
        windows_vk::char_to_vk(ch)
    }

    /// Translates a named key to a Windows virtual key code.
    pub fn key_to_windows_vk(key: Key) -> u8 {
        windows_vk::key_to_vk(key)
    }
}
