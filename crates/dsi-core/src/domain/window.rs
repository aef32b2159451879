//! The window capability contract.
//!
//! Every backend hands out window objects implementing [`Window`].  A window
//! object is a thin handle: an opaque native identifier plus a reference to
//! the connection that resolved it.  Nothing is cached, so every accessor is
//! an independent native round trip and two consecutive calls may observe
//! different state.
//!
//! # Stale handles
//!
//! The native window may close at any point after enumeration.  Accessors on
//! a vanished window report the attribute as absent (`None`, or `false` for
//! [`Window::active`]).  Operations that cannot proceed without window data
//! return [`DsiError::WindowUnavailable`] or [`DsiError::CaptureFailed`].

use std::fmt;

use crate::domain::buttons::MouseButton;
use crate::domain::geometry::Rect;
use crate::domain::image::Image;
use crate::error::DsiError;
use crate::keymap::Key;

/// Operations every backend window supports.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Window {
    /// The native identifier (XID on X11, HWND value on Win32).
    fn handle(&self) -> u64;

    /// Window title, or `None` if the window has no name.
    fn name(&self) -> Option<String>;

    /// Process ID of the owning process, or `None` if unavailable.
    fn pid(&self) -> Option<u32>;

    /// `true` if this window is the active (foreground) window.
    fn active(&self) -> bool;

    /// Position and size of the window, or `None` for a vanished window.
    fn geometry(&self) -> Option<Rect>;

    /// Captures the pixels of `region`, or of the whole window when `None`.
    ///
    /// The region is passed to the native call as given; a region outside
    /// the window's bounds has backend-defined results.
    ///
    /// # Errors
    ///
    /// Returns [`DsiError::CaptureFailed`] if the native capture fails and
    /// [`DsiError::WindowUnavailable`] if `region` is `None` and the window
    /// geometry cannot be read.
    fn capture(&self, region: Option<Rect>) -> Result<Image, DsiError>;

    /// Sends the keystroke for `ch` to the window.
    fn send_character(&self, ch: char) -> Result<(), DsiError>;

    /// Sends each character of `text` in order, one at a time.
    fn send_string(&self, text: &str) -> Result<(), DsiError> {
        for ch in text.chars() {
            self.send_character(ch)?;
        }
        Ok(())
    }

    /// Sends a named, usually non-printable, key.
    fn send_key(&self, key: Key) -> Result<(), DsiError>;

    /// Moves the pointer to `(x, y)` relative to `region`, or to the window
    /// itself when `None`.
    fn warp_pointer(&self, x: i32, y: i32, region: Option<Rect>) -> Result<(), DsiError>;

    /// Sends a press followed by a release of `button` at window-relative
    /// `(x, y)`.  Some applications only react after the pointer has been
    /// moved there with [`Window::warp_pointer`].
    fn send_click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), DsiError>;

    /// Reads name, pid, active state and geometry in four separate queries.
    fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            handle: self.handle(),
            name: self.name(),
            pid: self.pid(),
            active: self.active(),
            geometry: self.geometry(),
        }
    }
}

/// Attributes of a window read at (roughly) one point in time.
///
/// The four values come from independent queries and are not guaranteed to
/// be mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub handle: u64,
    pub name: Option<String>,
    pub pid: Option<u32>,
    pub active: bool,
    pub geometry: Option<Rect>,
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Window(")?;
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            write!(f, "name=\"{name}\", ")?;
        }
        match self.pid {
            Some(pid) => write!(f, "pid={pid}, ")?,
            None => f.write_str("pid=None, ")?,
        }
        write!(f, "active={}, ", self.active)?;
        match self.geometry {
            Some(geometry) => write!(f, "geometry={geometry})"),
            None => f.write_str("geometry=None)"),
        }
    }
}
