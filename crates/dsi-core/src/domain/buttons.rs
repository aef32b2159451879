//! Mouse buttons.

use std::fmt;
use std::str::FromStr;

use crate::error::DsiError;

/// The mouse buttons a click can be synthesized for.
///
/// Each backend maps these to its own codes:
///
/// | Button     | X11 button | Win32 messages                   |
/// |------------|------------|----------------------------------|
/// | `Left`     | 1          | `WM_LBUTTONDOWN` / `WM_LBUTTONUP` |
/// | `Middle`   | 2          | `WM_MBUTTONDOWN` / `WM_MBUTTONUP` |
/// | `Right`    | 3          | `WM_RBUTTONDOWN` / `WM_RBUTTONUP` |
/// | `Backward` | 8          | `WM_XBUTTON*` with `XBUTTON1`     |
/// | `Forward`  | 9          | `WM_XBUTTON*` with `XBUTTON2`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
    Forward,
    Backward,
}

impl MouseButton {
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Forward,
        MouseButton::Backward,
    ];

    /// The legacy numeric code (LEFT=1, RIGHT=2, MIDDLE=3, FORWARD=4, BACKWARD=5).
    pub fn code(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Right => 2,
            MouseButton::Middle => 3,
            MouseButton::Forward => 4,
            MouseButton::Backward => 5,
        }
    }

    /// X protocol button number.
    pub fn x11_button(self) -> u32 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::Backward => 8,
            MouseButton::Forward => 9,
        }
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = DsiError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(MouseButton::Left),
            2 => Ok(MouseButton::Right),
            3 => Ok(MouseButton::Middle),
            4 => Ok(MouseButton::Forward),
            5 => Ok(MouseButton::Backward),
            other => Err(DsiError::InvalidMouseButton(other.to_string())),
        }
    }
}

impl FromStr for MouseButton {
    type Err = DsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "forward" => Ok(MouseButton::Forward),
            "backward" | "back" => Ok(MouseButton::Backward),
            _ => Err(DsiError::InvalidMouseButton(s.to_string())),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::Forward => "forward",
            MouseButton::Backward => "backward",
        };
        f.write_str(name)
    }
}
