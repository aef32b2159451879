//! Session detection and backend selection.
//!
//! Backend selection happens once, when the facade is constructed:
//!
//! ```text
//! OsFamily::current()
//!  ├─ Linux   → detect_display_server()
//!  │             ├─ X11      → BackendKind::X11
//!  │             ├─ Wayland  → NotImplemented("Wayland")
//!  │             └─ Unknown  → DisplayServerNotSupported
//!  ├─ Windows → BackendKind::Win32
//!  ├─ MacOs   → NotImplemented("macOS")
//!  └─ Other   → OsNotSupported
//! ```

use std::fmt;

use crate::error::DsiError;

/// Operating system family the process is running on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Windows,
    MacOs,
    Other(String),
}

impl OsFamily {
    /// The family of the compile target.
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    /// Classifies an `std::env::consts::OS`-style name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "linux" => OsFamily::Linux,
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            other => OsFamily::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::Windows => "windows",
            OsFamily::MacOs => "macos",
            OsFamily::Other(name) => name,
        }
    }
}

/// Display server protocol of a Linux session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    X11,
    Wayland,
    Unknown,
}

impl fmt::Display for DisplayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayServer::X11 => "x11",
            DisplayServer::Wayland => "wayland",
            DisplayServer::Unknown => "unknown",
        })
    }
}

/// Detects the display server from the process environment.
pub fn detect_display_server() -> DisplayServer {
    detect_display_server_with(|name| std::env::var(name).ok())
}

/// Detects the display server using `lookup` to read environment variables.
///
/// Signals are consulted in priority order: `XDG_SESSION_TYPE` equal to
/// `wayland` or `x11`, then presence of `WAYLAND_DISPLAY`, then presence of
/// `DISPLAY`.
pub fn detect_display_server_with<F>(lookup: F) -> DisplayServer
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("XDG_SESSION_TYPE").as_deref() {
        Some("wayland") => return DisplayServer::Wayland,
        Some("x11") => return DisplayServer::X11,
        _ => {}
    }

    if lookup("WAYLAND_DISPLAY").is_some() {
        return DisplayServer::Wayland;
    }

    if lookup("DISPLAY").is_some() {
        return DisplayServer::X11;
    }

    DisplayServer::Unknown
}

/// The backend chosen for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    X11,
    Win32,
}

/// Chooses the backend for `os`.
///
/// `display_server` is only consulted on Linux.
///
/// # Errors
///
/// - [`DsiError::NotImplemented`] for Wayland sessions and macOS.
/// - [`DsiError::DisplayServerNotSupported`] for an unrecognised Linux session.
/// - [`DsiError::OsNotSupported`] for any other operating system.
pub fn select_backend<F>(os: &OsFamily, display_server: F) -> Result<BackendKind, DsiError>
where
    F: FnOnce() -> DisplayServer,
{
    match os {
        OsFamily::Linux => match display_server() {
            DisplayServer::X11 => Ok(BackendKind::X11),
            DisplayServer::Wayland => Err(DsiError::NotImplemented("Wayland")),
            unknown @ DisplayServer::Unknown => Err(DsiError::DisplayServerNotSupported(unknown)),
        },
        OsFamily::Windows => Ok(BackendKind::Win32),
        OsFamily::MacOs => Err(DsiError::NotImplemented("macOS")),
        OsFamily::Other(name) => Err(DsiError::OsNotSupported(name.clone())),
    }
}
