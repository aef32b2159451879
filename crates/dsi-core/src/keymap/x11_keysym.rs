//! Character and named-key to X11 KeySym translation.
//!
//! KeySym values are defined in X11/keysymdef.h.
//!
//! Printable Latin-1 characters (U+0020..U+007E, U+00A0..U+00FF) use their
//! code point as KeySym, so `'a'` is `XK_a = 0x61` and `'A'` is
//! `XK_A = 0x41`.  Any other Unicode character uses the direct Unicode
//! mapping `0x0100_0000 | codepoint` that Xlib understands since X11R6.9.

use super::Key;

const XK_BACKSPACE: u32 = 0xFF08;
const XK_TAB: u32 = 0xFF09;
const XK_RETURN: u32 = 0xFF0D;
const XK_ESCAPE: u32 = 0xFF1B;
const XK_DELETE: u32 = 0xFFFF;
const XK_F1: u32 = 0xFFBE;

const UNICODE_KEYSYM_BASE: u32 = 0x0100_0000;

/// Translates `ch` to a KeySym.
///
/// Returns `None` for control characters other than newline, carriage
/// return, tab, backspace, escape and delete.
pub fn char_to_keysym(ch: char) -> Option<u32> {
    let cp = ch as u32;
    match ch {
        '\n' | '\r' => Some(XK_RETURN),
        '\t' => Some(XK_TAB),
        '\u{8}' => Some(XK_BACKSPACE),
        '\u{1b}' => Some(XK_ESCAPE),
        '\u{7f}' => Some(XK_DELETE),
        _ if ch.is_control() => None,
        _ if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) => Some(cp),
        _ => Some(UNICODE_KEYSYM_BASE | cp),
    }
}

/// Translates a named key to its KeySym.
pub fn key_to_keysym(key: Key) -> u32 {
    match key {
        Key::Enter => XK_RETURN,
        Key::Tab => XK_TAB,
        Key::Backspace => XK_BACKSPACE,
        Key::Escape => XK_ESCAPE,
        Key::Space => 0x0020,    // XK_space
        Key::Insert => 0xFF63,   // XK_Insert
        Key::Delete => XK_DELETE,
        Key::Home => 0xFF50,     // XK_Home
        Key::End => 0xFF57,      // XK_End
        Key::PageUp => 0xFF55,   // XK_Prior
        Key::PageDown => 0xFF56, // XK_Next
        Key::ArrowLeft => 0xFF51,
        Key::ArrowUp => 0xFF52,
        Key::ArrowRight => 0xFF53,
        Key::ArrowDown => 0xFF54,
        Key::F1 => XK_F1,
        Key::F2 => XK_F1 + 1,
        Key::F3 => XK_F1 + 2,
        Key::F4 => XK_F1 + 3,
        Key::F5 => XK_F1 + 4,
        Key::F6 => XK_F1 + 5,
        Key::F7 => XK_F1 + 6,
        Key::F8 => XK_F1 + 7,
        Key::F9 => XK_F1 + 8,
        Key::F10 => XK_F1 + 9,
        Key::F11 => XK_F1 + 10,
        Key::F12 => XK_F1 + 11,
    }
}
