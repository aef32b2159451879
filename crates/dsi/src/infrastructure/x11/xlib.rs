//! Xlib FFI implementation of [`XlibApi`].
//!
//! # Safety model
//!
//! `XlibConnection` owns one `*mut Display` for its whole lifetime and closes
//! it on drop.  Xlib connections are not thread-safe, and the raw pointer
//! keeps `XlibConnection` `!Send`/`!Sync`, so the compiler enforces the
//! single-thread rule.
//!
//! Every value handed out (`XProperty`, `XChildren`, `XImageHandle`) wraps a
//! pointer allocated by Xlib.  They are only created here and only released
//! through `free_property`, `free_children` and `destroy_image`.
//!
//! # Protocol errors
//!
//! Xlib reports asynchronous errors through a single process-global handler.
//! The handler installed here logs each error at `debug` and routes it to the
//! [`ErrorSink`] registered for the display it arrived on.  The default Xlib
//! handler would print and `exit()` the process instead.

use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::{c_int, c_long, c_short, c_uchar, c_uint};
use std::ptr;
use std::sync::{Mutex, Once, OnceLock, PoisonError};

use dsi_core::{DsiError, ErrorSink, ProtocolError, Rect};
use tracing::{debug, info};
use x11::xlib;

use super::{Atom, ImageData, PropertyData, SyntheticEvent, X11Backend, X11Options, XlibApi, Xid};

// `XChildren` reinterprets Xlib's `Window` array as `[Xid]`.
const _: () = assert!(std::mem::size_of::<xlib::Window>() == std::mem::size_of::<Xid>());

// ── Protocol error routing ────────────────────────────────────────────────────

/// Error sinks keyed by display pointer address.
fn sinks() -> &'static Mutex<HashMap<usize, ErrorSink>> {
    static SINKS: OnceLock<Mutex<HashMap<usize, ErrorSink>>> = OnceLock::new();
    SINKS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn install_error_handler() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // SAFETY: `on_protocol_error` matches the XErrorHandler signature and
        // never unwinds across the FFI boundary on its own.
        unsafe {
            xlib::XSetErrorHandler(Some(on_protocol_error));
        }
    });
}

/// Process-wide Xlib error handler.
///
/// # Safety
///
/// Called by Xlib with a valid display and error event for the duration of
/// the call.
unsafe extern "C" fn on_protocol_error(
    display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    if event.is_null() {
        return 0;
    }
    let e = &*event;
    let err = ProtocolError {
        serial: e.serial as u64,
        error_code: e.error_code,
        request_code: e.request_code,
        minor_code: e.minor_code,
        resource_id: e.resourceid as u64,
    };
    debug!(%err, "X protocol error");

    let sink = sinks()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&(display as usize))
        .cloned();
    if let Some(sink) = sink {
        sink(&err);
    }
    0
}

// ── Allocated values ──────────────────────────────────────────────────────────

/// Property buffer from `XGetWindowProperty`, released with `XFree`.
pub struct XProperty {
    data: *mut c_uchar,
    format: i32,
    nitems: usize,
}

impl PropertyData for XProperty {
    fn format(&self) -> i32 {
        self.format
    }

    fn bytes(&self) -> &[u8] {
        let item_size = match self.format {
            8 => 1,
            16 => std::mem::size_of::<c_short>(),
            32 => std::mem::size_of::<c_long>(),
            _ => 0,
        };
        // SAFETY: Xlib allocates `nitems` items of the in-memory item size,
        // and the buffer lives until `free_property` consumes `self`.
        unsafe { std::slice::from_raw_parts(self.data, self.nitems * item_size) }
    }
}

/// Child list from `XQueryTree`, released with `XFree`.
pub struct XChildren {
    ptr: *mut xlib::Window,
    len: usize,
}

impl AsRef<[Xid]> for XChildren {
    fn as_ref(&self) -> &[Xid] {
        if self.ptr.is_null() {
            return &[];
        }
        // SAFETY: `ptr` points to `len` windows, and `xlib::Window` has the
        // size of `Xid` (checked above).
        unsafe { std::slice::from_raw_parts(self.ptr as *const Xid, self.len) }
    }
}

/// Image from `XGetImage`, released through its `destroy_image` hook.
pub struct XImageHandle(*mut xlib::XImage);

impl ImageData for XImageHandle {
    fn width(&self) -> u32 {
        // SAFETY: non-null image owned by this handle.
        unsafe { (*self.0).width.max(0) as u32 }
    }

    fn height(&self) -> u32 {
        // SAFETY: as above.
        unsafe { (*self.0).height.max(0) as u32 }
    }

    fn bytes_per_line(&self) -> usize {
        // SAFETY: as above.
        unsafe { (*self.0).bytes_per_line.max(0) as usize }
    }

    fn bits_per_pixel(&self) -> u32 {
        // SAFETY: as above.
        unsafe { (*self.0).bits_per_pixel.max(0) as u32 }
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: a ZPixmap image holds `bytes_per_line * height` bytes.
        unsafe {
            let data = (*self.0).data;
            if data.is_null() {
                return &[];
            }
            std::slice::from_raw_parts(
                data as *const u8,
                self.bytes_per_line() * self.height() as usize,
            )
        }
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

/// An open Xlib display connection.
pub struct XlibConnection {
    display: *mut xlib::Display,
    root: Xid,
}

impl XlibConnection {
    /// Opens the display named in `options` (or `$DISPLAY`).
    ///
    /// # Errors
    ///
    /// Returns [`DsiError::DisplayUnavailable`] if the name contains a NUL
    /// byte or `XOpenDisplay` fails.
    pub fn open(options: X11Options) -> Result<Self, DsiError> {
        let described = options
            .display
            .clone()
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_else(|| "<unset>".to_string());
        let name = options
            .display
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|_| {
            DsiError::DisplayUnavailable("display name contains a NUL byte".to_string())
        })?;

        install_error_handler();

        // SAFETY: `name` is either null (use $DISPLAY) or a valid C string
        // that outlives the call.
        let display = unsafe {
        xlib::XOpenDisplay(name.as_ref().map_or(ptr::null(), |n| n.as_ptr()))
    };
        if display.is_null() {
            return Err(DsiError::DisplayUnavailable(format!(
                "XOpenDisplay failed; DISPLAY={described}"
            )));
        }

        if let Some(sink) = options.error_sink {
            sinks()
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(display as usize, sink);
        }

        // SAFETY: `display` is a live connection.
        let root = unsafe { xlib::XDefaultRootWindow(display) } as Xid;
        info!(display = %described, root = %format_args!("{root:#x}"), "opened X11 display");
        Ok(Self { display, root })
    }
}

impl Drop for XlibConnection {
    fn drop(&mut self) {
        sinks()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(self.display as usize));
        // SAFETY: the display was opened in `open` and is closed exactly once.
        unsafe {
            xlib::XCloseDisplay(self.display);
        }
    }
}

impl X11Backend<XlibConnection> {
    /// Opens a display connection and wraps it in a backend.
    pub fn open(options: X11Options) -> Result<Self, DsiError> {
        XlibConnection::open(options).map(Self::new)
    }
}

fn as_bool(value: bool) -> xlib::Bool {
    if value {
        xlib::True
    } else {
        xlib::False
    }
}

impl XlibApi for XlibConnection {
    type Property = XProperty;
    type Children = XChildren;
    type Image = XImageHandle;

    fn root_window(&self) -> Xid {
        self.root
    }

    fn intern_atom(&self, name: &str) -> Atom {
        let Ok(name) = CString::new(name) else {
            return 0;
        };
        // SAFETY: live display, valid C string.
        unsafe { xlib::XInternAtom(self.display, name.as_ptr(), xlib::False) as Atom }
    }

    fn get_window_property(
        &self,
        window: Xid,
        property: Atom,
        max_items: i64,
    ) -> Option<XProperty> {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: std::os::raw::c_ulong = 0;
        let mut bytes_after: std::os::raw::c_ulong = 0;
        let mut data: *mut c_uchar = ptr::null_mut();

        // SAFETY: live display; every out-pointer refers to a local.
        let status = unsafe {
            xlib::XGetWindowProperty(
                self.display,
                window as xlib::Window,
                property as xlib::Atom,
                0,
                max_items as c_long,
                xlib::False,
                xlib::AnyPropertyType as xlib::Atom,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            )
        };
        if data.is_null() {
            return None;
        }
        let prop = XProperty {
            data,
            format: actual_format,
            nitems: nitems as usize,
        };
        if status != 0 || actual_type == 0 {
            self.free_property(prop);
            return None;
        }
        Some(prop)
    }

    fn free_property(&self, property: XProperty) {
        // SAFETY: `data` was allocated by XGetWindowProperty and is freed once.
        unsafe {
            xlib::XFree(property.data.cast());
        }
    }

    fn query_tree(&self, window: Xid) -> Option<XChildren> {
        let mut root: xlib::Window = 0;
        let mut parent: xlib::Window = 0;
        let mut children: *mut xlib::Window = ptr::null_mut();
        let mut count: c_uint = 0;

        // SAFETY: live display; every out-pointer refers to a local.
        let status = unsafe {
            xlib::XQueryTree(
                self.display,
                window as xlib::Window,
                &mut root,
                &mut parent,
                &mut children,
                &mut count,
            )
        };
        let list = XChildren {
            ptr: children,
            len: count as usize,
        };
        if status == 0 {
            self.free_children(list);
            return None;
        }
        Some(list)
    }

    fn free_children(&self, children: XChildren) {
        if children.ptr.is_null() {
            return;
        }
        // SAFETY: `ptr` was allocated by XQueryTree and is freed once.
        unsafe {
            xlib::XFree(children.ptr.cast());
        }
    }

    fn window_attributes(&self, window: Xid) -> Option<Rect> {
        // SAFETY: XWindowAttributes is plain data; zeroed is a valid value.
        let mut attrs: xlib::XWindowAttributes = unsafe { std::mem::zeroed() };
        // SAFETY: live display; `attrs` is a valid out-pointer.
        let status = unsafe {
        xlib::XGetWindowAttributes(self.display, window as xlib::Window, &mut attrs)
    };
        (status != 0).then(|| Rect::new(attrs.x, attrs.y, attrs.width, attrs.height))
    }

    fn get_image(
        &self,
        window: Xid,
        region: Rect,
        plane_mask: u64,
        format: i32,
    ) -> Option<XImageHandle> {
        // SAFETY: live display.  Out-of-range regions make the server
        // return BadMatch, which surfaces here as a null image.
        let image = unsafe {
            xlib::XGetImage(
                self.display,
                window as xlib::Drawable,
                region.x,
                region.y,
                region.width as c_uint,
                region.height as c_uint,
                plane_mask as std::os::raw::c_ulong,
                format,
            )
        };
        (!image.is_null()).then_some(XImageHandle(image))
    }

    fn destroy_image(&self, image: XImageHandle) {
        // SAFETY: `image.0` came from XGetImage; XDestroyImage is the
        // image's own `destroy_image` hook.
        unsafe {
            if let Some(destroy) = (*image.0).funcs.destroy_image {
                destroy(image.0);
            }
        }
    }

    fn keysym_to_keycode(&self, keysym: u64) -> u8 {
        // SAFETY: live display.
        unsafe { xlib::XKeysymToKeycode(self.display, keysym as xlib::KeySym) }
    }

    fn send_event(
        &self,
        window: Xid,
        propagate: bool,
        event_mask: i64,
        event: &SyntheticEvent,
    ) -> bool {
        let mut xevent = match *event {
            SyntheticEvent::KeyPress { window, keycode, state } => {
                // SAFETY: XKeyEvent is plain data; zeroed is a valid value.
                let mut key: xlib::XKeyEvent = unsafe { std::mem::zeroed() };
                key.type_ = xlib::KeyPress;
                key.display = self.display;
                key.window = window as xlib::Window;
                key.root = window as xlib::Window;
                key.state = state;
                key.keycode = c_uint::from(keycode);
                key.same_screen = xlib::True;
                xlib::XEvent::from(key)
            }
            SyntheticEvent::ButtonPress { window, x, y, button }
            | SyntheticEvent::ButtonRelease { window, x, y, button } => {
                // SAFETY: XButtonEvent is plain data; zeroed is a valid value.
                let mut btn: xlib::XButtonEvent = unsafe { std::mem::zeroed() };
                btn.type_ = if matches!(event, SyntheticEvent::ButtonPress { .. }) {
                    xlib::ButtonPress
                } else {
                    xlib::ButtonRelease
                };
                btn.display = self.display;
                btn.window = window as xlib::Window;
                btn.root = window as xlib::Window;
                btn.x = x;
                btn.y = y;
                btn.button = button;
                btn.same_screen = xlib::True;
                xlib::XEvent::from(btn)
            }
        };

        // SAFETY: live display; `xevent` is fully initialised.
        let status = unsafe {
            xlib::XSendEvent(
                self.display,
                window as xlib::Window,
                as_bool(propagate),
                event_mask as c_long,
                &mut xevent,
            )
        };
        status != 0
    }

    fn warp_pointer(&self, dest: Xid, x: i32, y: i32) {
        // SAFETY: live display.  A zero source window means "anywhere".
        unsafe {
            xlib::XWarpPointer(self.display, 0, dest as xlib::Window, 0, 0, 0, 0, x, y);
        }
    }

    fn flush(&self) {
        // SAFETY: live display.
        unsafe {
            xlib::XFlush(self.display);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_open_rejects_display_name_with_nul() {
        let options = X11Options {
            display: Some(":0\0evil".to_string()),
            error_sink: None,
        };
        assert!(matches!(
            XlibConnection::open(options),
            Err(DsiError::DisplayUnavailable(_))
        ));
    }

    #[test]
    fn test_open_unreachable_display_is_unavailable() {
        let options = X11Options {
            display: Some("dsi-no-such-host.invalid:97".to_string()),
            error_sink: None,
        };
        match XlibConnection::open(options) {
            Err(DsiError::DisplayUnavailable(msg)) => {
                assert!(msg.contains("dsi-no-such-host.invalid:97"), "got {msg}")
            }
            Err(other) => panic!("expected DisplayUnavailable, got {other:?}"),
            Ok(_) => panic!("expected DisplayUnavailable, got a connection"),
        }
    }

    /// A `BadWindow` error event as Xlib would deliver it.
    fn bad_window_event() -> xlib::XErrorEvent {
        // SAFETY: XErrorEvent is a plain C struct; all-zero is a valid value.
        let mut event: xlib::XErrorEvent = unsafe { std::mem::zeroed() };
        event.error_code = 3;
        event.serial = 17;
        event.resourceid = 0x2a;
        event
    }

    #[test]
    fn test_protocol_error_is_routed_to_the_display_sink() {
        // Arrange
        let display_key = 0xdead_0000_usize;
        let seen: Arc<Mutex<Vec<ProtocolError>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let sink: ErrorSink = Arc::new(move |err: &ProtocolError| {
            recorder.lock().unwrap().push(*err);
        });
        sinks().lock().unwrap().insert(display_key, sink);
        let mut event = bad_window_event();

        // Act
        // SAFETY: the handler only uses the display pointer as a map key.
        let status = unsafe { on_protocol_error(display_key as *mut xlib::Display, &mut event) };
        sinks().lock().unwrap().remove(&display_key);

        // Assert
        assert_eq!(status, 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].error_code, 3);
        assert_eq!(seen[0].serial, 17);
        assert_eq!(seen[0].resource_id, 0x2a);
    }

    #[test]
    fn test_protocol_error_without_sink_is_swallowed() {
        let mut event = bad_window_event();

        // SAFETY: as above; no sink is registered under this key.
        let status =
            unsafe { on_protocol_error(0xdead_1000_usize as *mut xlib::Display, &mut event) };

        assert_eq!(status, 0);
    }
}
