//! # dsi-core
//!
//! Shared foundation for display server interactions: the value types that
//! cross the backend boundary, the window capability contract every backend
//! implements, key translation tables, and the session detection used to pick
//! a backend at startup.
//!
//! This crate has zero dependencies on OS APIs.  Everything that talks to an
//! X server or to Win32 lives in the `dsi` crate.
//!
//! # Architecture overview
//!
//! - **`domain`** – `Rect`, `MouseButton`, `Image`, the `Window` trait and
//!   `WindowSnapshot`, plus session detection (`OsFamily`, `DisplayServer`)
//!   and backend selection.
//!
//! - **`keymap`** – Translation from characters and named keys to X11 KeySyms
//!   and Windows virtual key codes.
//!
//! - **`error`** – The `DsiError` taxonomy shared by both backends.

pub mod domain;
pub mod error;
pub mod keymap;

// Re-export the most-used types at the crate root so callers can write
// `dsi_core::Rect` instead of `dsi_core::domain::geometry::Rect`.
pub use domain::buttons::MouseButton;
pub use domain::geometry::Rect;
pub use domain::image::{ChannelOrder, Image};
pub use domain::session::{
    detect_display_server, select_backend, BackendKind, DisplayServer, OsFamily,
};
pub use domain::window::{Window, WindowSnapshot};
pub use error::{DsiError, ErrorSink, ProtocolError};
pub use keymap::{Key, KeyMapper};

#[cfg(any(test, feature = "mock"))]
pub use domain::window::MockWindow;
