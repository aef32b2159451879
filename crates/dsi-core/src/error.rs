//! Error taxonomy shared by every backend.
//!
//! Absent attributes (a window without a name, a window without a PID) are not
//! errors: they surface as `None`.  `DsiError` is reserved for construction
//! failures, invalid arguments, and operations that cannot produce a result at
//! all (for example capturing a window that no longer exists).

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::session::DisplayServer;

/// Error type for facade construction and window operations.
#[derive(Debug, Error, PartialEq)]
pub enum DsiError {
    /// The operating system family has no backend.
    #[error("operating system not supported: {0}")]
    OsNotSupported(String),

    /// The Linux session runs a display server without a backend.
    #[error("display server not supported: {0}")]
    DisplayServerNotSupported(DisplayServer),

    /// A known platform whose backend has not been written yet.
    #[error("{0} is not yet implemented")]
    NotImplemented(&'static str),

    /// The native display connection or library could not be opened.
    ///
    /// The inner string carries the OS-level detail, e.g.
    /// "XOpenDisplay failed; DISPLAY=<unset>".
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),

    /// A mouse button value outside the closed `MouseButton` set.
    #[error("invalid button code '{0}'")]
    InvalidMouseButton(String),

    /// A key name with no `Key` variant.
    #[error("unknown key name '{0}'")]
    UnknownKey(String),

    /// The window referenced by the handle no longer answers queries.
    #[error("window {0:#x} is unavailable")]
    WindowUnavailable(u64),

    /// The native capture path reported a failure.
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// The OS refused a synthesized input action that has no target window,
    /// such as moving the system cursor.
    #[error("input synthesis failed: {0}")]
    InputFailed(String),

    /// The captured image is not 32 bits per pixel.
    #[error("unsupported pixel format: {bits_per_pixel} bits per pixel")]
    UnsupportedPixelFormat { bits_per_pixel: u32 },

    /// A pixel buffer whose length does not match `width * height * 4`.
    #[error("invalid image buffer: expected {expected} bytes, got {actual}")]
    InvalidImage { expected: usize, actual: usize },
}

/// An asynchronous protocol error reported by the X server.
///
/// Protocol errors never fail the request that triggered them; they are
/// logged and handed to the connection's [`ErrorSink`], if one is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolError {
    /// Serial number of the failed request.
    pub serial: u64,
    /// X error code (e.g. 3 = BadWindow).
    pub error_code: u8,
    /// Major opcode of the failed request.
    pub request_code: u8,
    /// Minor opcode of the failed request.
    pub minor_code: u8,
    /// Resource the failed request referred to.
    pub resource_id: u64,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "XErrorEvent(serial={}, error_code={}, request_code={}, minor_code={}, resource={:#x})",
            self.serial, self.error_code, self.request_code, self.minor_code, self.resource_id
        )
    }
}

/// Callback receiving protocol errors for one connection.
pub type ErrorSink = Arc<dyn Fn(&ProtocolError) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mouse_button_message_names_the_value() {
        let err = DsiError::InvalidMouseButton("7".to_string());
        assert_eq!(err.to_string(), "invalid button code '7'");
    }

    #[test]
    fn test_window_unavailable_formats_handle_as_hex() {
        let err = DsiError::WindowUnavailable(0x3a0_0007);
        assert_eq!(err.to_string(), "window 0x3a00007 is unavailable");
    }

    #[test]
    fn test_protocol_error_display_lists_codes() {
        let err = ProtocolError {
            serial: 42,
            error_code: 3,
            request_code: 20,
            minor_code: 0,
            resource_id: 0x1c0_0001,
        };
        let text = err.to_string();
        assert!(text.contains("error_code=3"));
        assert!(text.contains("request_code=20"));
        assert!(text.contains("resource=0x1c00001"));
    }
}
