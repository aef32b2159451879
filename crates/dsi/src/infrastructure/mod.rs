//! Infrastructure layer: native backend adapters, configuration and resource
//! guards.
//!
//! The X11 and Win32 adapter modules compile on every platform; only their
//! FFI submodules (`x11::xlib`, `win32::user32`) are gated on `target_os`.

pub mod config;
pub mod guard;
pub mod win32;
pub mod x11;
