//! Character and named-key to Windows Virtual Key (VK) translation.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! Windows VK codes identify logical keys rather than characters, so only
//! characters that *are* a key (Enter, Tab, Backspace, Escape) get a VK here.
//! Printable characters are delivered through `WM_CHAR` with their UTF-16
//! code units, which respects case and layout without modifier tracking.

use super::Key;

const VK_BACK: u8 = 0x08;
const VK_TAB: u8 = 0x09;
const VK_RETURN: u8 = 0x0D;
const VK_ESCAPE: u8 = 0x1B;
const VK_F1: u8 = 0x70;

/// Translates `ch` to a VK code when it corresponds to a dedicated key.
pub fn char_to_vk(ch: char) -> Option<u8> {
    match ch {
        '\n' | '\r' => Some(VK_RETURN),
        '\t' => Some(VK_TAB),
        '\u{8}' => Some(VK_BACK),
        '\u{1b}' => Some(VK_ESCAPE),
        _ => None,
    }
}

/// Translates a named key to its VK code.
pub fn key_to_vk(key: Key) -> u8 {
    match key {
        Key::Enter => VK_RETURN,
        Key::Tab => VK_TAB,
        Key::Backspace => VK_BACK,
        Key::Escape => VK_ESCAPE,
        Key::Space => 0x20,     // VK_SPACE
        Key::PageUp => 0x21,    // VK_PRIOR
        Key::PageDown => 0x22,  // VK_NEXT
        Key::End => 0x23,       // VK_END
        Key::Home => 0x24,      // VK_HOME
        Key::ArrowLeft => 0x25, // VK_LEFT
        Key::ArrowUp => 0x26,   // VK_UP
        Key::ArrowRight => 0x27,
        Key::ArrowDown => 0x28,
        Key::Insert => 0x2D,    // VK_INSERT
        Key::Delete => 0x2E,    // VK_DELETE
        Key::F1 => VK_F1,
        Key::F2 => VK_F1 + 1,
        Key::F3 => VK_F1 + 2,
        Key::F4 => VK_F1 + 3,
        Key::F5 => VK_F1 + 4,
        Key::F6 => VK_F1 + 5,
        Key::F7 => VK_F1 + 6,
        Key::F8 => VK_F1 + 7,
        Key::F9 => VK_F1 + 8,
        Key::F10 => VK_F1 + 9,
        Key::F11 => VK_F1 + 10,
        Key::F12 => VK_F1 + 11,
    }
}
