//! # dsi
//!
//! Window enumeration, pixel capture and input synthesis behind one facade,
//! backed by Xlib on Linux/X11 and by User32/GDI on Windows.
//!
//! # Architecture overview
//!
//! - **`application`** – The [`Dsi`] facade and the [`Backend`] trait it is
//!   generic over.  Backend selection happens once, at construction.
//!
//! - **`infrastructure`** – The two backend adapters, each written against a
//!   narrow trait over the native API (`XlibApi`, `Win32Api`) so the adapter
//!   logic can be exercised with the recording mocks in `x11::mock` and
//!   `win32::mock`.  Also holds the TOML configuration layer and the RAII
//!   guard used to release native resources.
//!
//! # Example
//!
//! ```no_run
//! use dsi::Dsi;
//! use dsi_core::Window;
//!
//! let dsi = Dsi::new()?;
//! if let Some(win) = dsi.get_window_by_name("Terminal") {
//!     let img = win.capture(None)?;
//!     println!("{:?} {:?}", win.snapshot(), img.get_pixel(0, 0));
//! }
//! # Ok::<(), dsi_core::DsiError>(())
//! ```

pub mod application;
pub mod infrastructure;

pub use application::facade::{Backend, Dsi, NativeBackend};
pub use infrastructure::config::{load_config, load_config_from, save_config, DsiConfig};
