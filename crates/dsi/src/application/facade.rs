//! The `Dsi` facade: backend selection plus window lookup.
//!
//! ```text
//! Dsi::new()
//!   └─ select_backend(OsFamily::current(), detect_display_server)
//!        ├─ X11   → X11Backend<XlibConnection>   (Linux)
//!        └─ Win32 → Win32Backend<User32>         (Windows)
//! ```
//!
//! Selection happens once.  Afterwards the facade is a thin layer over the
//! backend's two enumeration primitives; the lookups below are linear scans
//! over a fresh enumeration, so they reflect the window list at call time.

use dsi_core::{select_backend, detect_display_server, DsiError, OsFamily, Window};
use tracing::{debug, info};

use crate::infrastructure::config::DsiConfig;

#[cfg(target_os = "linux")]
use crate::infrastructure::x11::{xlib::XlibConnection, X11Backend};

#[cfg(target_os = "windows")]
use crate::infrastructure::win32::{user32::User32, Win32Backend};

/// A windowing backend: the source of window handles.
pub trait Backend {
    type Window: Window;

    /// The window that currently has input focus, if any.
    fn active_window(&self) -> Option<Self::Window>;

    /// Every window the backend can enumerate, in backend order.
    fn all_windows(&self) -> Vec<Self::Window>;
}

/// The backend compiled for the target platform.
#[cfg(target_os = "linux")]
pub type NativeBackend = X11Backend<XlibConnection>;

/// The backend compiled for the target platform.
#[cfg(target_os = "windows")]
pub type NativeBackend = Win32Backend<User32>;

/// The backend compiled for the target platform.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub type NativeBackend = unsupported::UnsupportedBackend;

/// Stand-in for platforms without a backend.  It cannot be constructed;
/// `Dsi::new` fails during selection instead.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub mod unsupported {
    use dsi_core::{DsiError, Image, Key, MouseButton, Rect, Window};

    pub enum UnsupportedBackend {}
    pub enum UnsupportedWindow {}

    impl super::Backend for UnsupportedBackend {
        type Window = UnsupportedWindow;
        fn active_window(&self) -> Option<UnsupportedWindow> {
            match *self {}
        }
        fn all_windows(&self) -> Vec<UnsupportedWindow> {
            match *self {}
        }
    }

    impl Window for UnsupportedWindow {
        fn handle(&self) -> u64 {
            match *self {}
        }
        fn name(&self) -> Option<String> {
            match *self {}
        }
        fn pid(&self) -> Option<u32> {
            match *self {}
        }
        fn active(&self) -> bool {
            match *self {}
        }
        fn geometry(&self) -> Option<Rect> {
            match *self {}
        }
        fn capture(&self, _: Option<Rect>) -> Result<Image, DsiError> {
            match *self {}
        }
        fn send_character(&self, _: char) -> Result<(), DsiError> {
            match *self {}
        }
        fn send_key(&self, _: Key) -> Result<(), DsiError> {
            match *self {}
        }
        fn warp_pointer(&self, _: i32, _: i32, _: Option<Rect>) -> Result<(), DsiError> {
            match *self {}
        }
        fn send_click(&self, _: i32, _: i32, _: MouseButton) -> Result<(), DsiError> {
            match *self {}
        }
    }
}

/// Entry point: enumerate and look up windows on the current display.
pub struct Dsi<B: Backend = NativeBackend> {
    backend: B,
    platform: OsFamily,
}

impl Dsi<NativeBackend> {
    /// Selects and opens the native backend with default settings.
    ///
    /// # Errors
    ///
    /// Fails with [`DsiError::NotImplemented`] on Wayland and macOS,
    /// [`DsiError::DisplayServerNotSupported`] for an unrecognised Linux
    /// session, [`DsiError::OsNotSupported`] elsewhere, and
    /// [`DsiError::DisplayUnavailable`] if the X display cannot be opened.
    pub fn new() -> Result<Self, DsiError> {
        Self::with_config(&DsiConfig::default())
    }

    /// Like [`Dsi::new`], taking connection settings from `config`.
    pub fn with_config(config: &DsiConfig) -> Result<Self, DsiError> {
        let platform = OsFamily::current();
        let kind = select_backend(&platform, detect_display_server)?;
        info!(os = platform.name(), backend = ?kind, "selected backend");
        let backend = open_native(config)?;
        Ok(Self { backend, platform })
    }
}

#[cfg(target_os = "linux")]
fn open_native(config: &DsiConfig) -> Result<NativeBackend, DsiError> {
    X11Backend::open(config.x11_options())
}

#[cfg(target_os = "windows")]
fn open_native(_config: &DsiConfig) -> Result<NativeBackend, DsiError> {
    Ok(Win32Backend::native())
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn open_native(_config: &DsiConfig) -> Result<NativeBackend, DsiError> {
    Err(DsiError::OsNotSupported(std::env::consts::OS.to_string()))
}

impl<B: Backend> Dsi<B> {
    /// Wraps an already-open backend, skipping selection.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            platform: OsFamily::current(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The operating system family this process runs on.
    pub fn platform(&self) -> &OsFamily {
        &self.platform
    }

    pub fn get_active_window(&self) -> Option<B::Window> {
        self.backend.active_window()
    }

    pub fn get_all_windows(&self) -> Vec<B::Window> {
        self.backend.all_windows()
    }

    /// The first window, in enumeration order, owned by process `pid`.
    pub fn get_window_by_pid(&self, pid: u32) -> Option<B::Window> {
        let found = self
            .backend
            .all_windows()
            .into_iter()
            .find(|w| w.pid() == Some(pid));
        debug!(pid, found = found.is_some(), "lookup by pid");
        found
    }

    /// The first window, in enumeration order, whose name contains `needle`.
    /// The match is case-sensitive; unnamed windows never match.
    pub fn get_window_by_name(&self, needle: &str) -> Option<B::Window> {
        let found = self
            .backend
            .all_windows()
            .into_iter()
            .find(|w| w.name().is_some_and(|name| name.contains(needle)));
        debug!(needle, found = found.is_some(), "lookup by name");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsi_core::MockWindow;

    /// Serves a fixed window list, building fresh mocks on every call.
    struct ListBackend {
        windows: Vec<(u64, Option<&'static str>, Option<u32>)>,
        active: Option<u64>,
    }

    impl ListBackend {
        fn mock(&(handle, name, pid): &(u64, Option<&'static str>, Option<u32>)) -> MockWindow {
            let mut w = MockWindow::new();
            w.expect_handle().return_const(handle);
            w.expect_name().returning(move || name.map(str::to_string));
            w.expect_pid().return_const(pid);
            w
        }
    }

    impl Backend for ListBackend {
        type Window = MockWindow;

        fn active_window(&self) -> Option<MockWindow> {
            let handle = self.active?;
            self.windows.iter().find(|w| w.0 == handle).map(Self::mock)
        }

        fn all_windows(&self) -> Vec<MockWindow> {
            self.windows.iter().map(Self::mock).collect()
        }
    }

    fn dsi() -> Dsi<ListBackend> {
        Dsi::with_backend(ListBackend {
            windows: vec![
                (1, None, Some(100)),
                (2, Some("Terminal - bash"), Some(200)),
                (3, Some("Editor"), Some(200)),
                (4, Some("terminal notes"), None),
            ],
            active: Some(3),
        })
    }

    #[test]
    fn test_get_window_by_pid_returns_first_match() {
        assert_eq!(dsi().get_window_by_pid(200).map(|w| w.handle()), Some(2));
    }

    #[test]
    fn test_get_window_by_pid_absent() {
        assert!(dsi().get_window_by_pid(999).is_none());
    }

    #[test]
    fn test_get_window_by_name_is_case_sensitive_substring() {
        let d = dsi();
        assert_eq!(d.get_window_by_name("Terminal").map(|w| w.handle()), Some(2));
        assert_eq!(d.get_window_by_name("terminal").map(|w| w.handle()), Some(4));
        assert!(d.get_window_by_name("TERMINAL").is_none());
    }

    #[test]
    fn test_get_window_by_name_skips_unnamed_windows() {
        // An empty needle matches any named window but never an unnamed one.
        assert_eq!(dsi().get_window_by_name("").map(|w| w.handle()), Some(2));
    }

    #[test]
    fn test_get_active_window_delegates_to_backend() {
        assert_eq!(dsi().get_active_window().map(|w| w.handle()), Some(3));
    }

    #[test]
    fn test_get_all_windows_preserves_backend_order() {
        let handles: Vec<u64> = dsi().get_all_windows().iter().map(|w| w.handle()).collect();
        assert_eq!(handles, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_platform_reports_current_os() {
        assert_eq!(dsi().platform(), &OsFamily::current());
    }
}
