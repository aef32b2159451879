//! X11 backend adapter.
//!
//! Windows are identified by XIDs; their attributes are atom-keyed properties
//! read with `XGetWindowProperty`, their pixels come from `XGetImage`, and
//! input is synthesized with `XSendEvent`.
//!
//! The adapter logic in this module is written against [`XlibApi`], a narrow
//! trait over the handful of Xlib calls it needs.  Two implementations exist:
//!
//! | Module  | Compiled on | Purpose                                   |
//! |---------|-------------|-------------------------------------------|
//! | `xlib`  | Linux       | Real FFI through the `x11` crate          |
//! | `mock`  | everywhere  | Recording fake used by unit/integration tests |
//!
//! # Resource discipline
//!
//! Three Xlib calls hand back client-side allocations: property buffers
//! (`XGetWindowProperty`), child lists (`XQueryTree`) and images
//! (`XGetImage`).  Each is wrapped in a [`Guard`] immediately, so the matching
//! `XFree`/`XDestroyImage` runs on every path out of the function, including
//! the "property present but undecodable" and "unsupported pixel format"
//! paths.
//!
//! # Buffered requests
//!
//! Xlib queues requests client-side.  Every synthesized event and every
//! pointer warp is followed by `XFlush`, otherwise the event would only
//! reach the server on the next unrelated round trip.

#[cfg(target_os = "linux")]
pub mod xlib;

pub mod mock;

use std::os::raw::c_long;
use std::rc::Rc;

use dsi_core::{ChannelOrder, DsiError, ErrorSink, Image, Key, KeyMapper, MouseButton, Rect, Window};
use tracing::{debug, trace, warn};

use crate::application::facade::Backend;
use crate::infrastructure::guard::Guard;

/// An X resource identifier (window, pixmap, ...).
pub type Xid = u64;

/// An interned property name.
pub type Atom = u64;

// ── X11 constants ─────────────────────────────────────────────────────────────

/// Upper bound on the number of 32-bit items requested per property read.
pub const PROPERTY_MAX_ITEMS: i64 = 1000;

/// `XGetImage` plane mask selecting the 24 colour bits.
pub const PLANE_MASK_RGB: u64 = 0x00FF_FFFF;

/// `ZPixmap` image format: pixels stored contiguously, one after another.
pub const ZPIXMAP: i32 = 2;

/// Modifier state bit for Shift.
pub const SHIFT_MASK: u32 = 1;

pub const KEY_PRESS_MASK: i64 = 1 << 0;
pub const BUTTON_PRESS_MASK: i64 = 1 << 2;
pub const BUTTON_RELEASE_MASK: i64 = 1 << 3;

const NET_WM_NAME: &str = "_NET_WM_NAME";
const NET_WM_PID: &str = "_NET_WM_PID";
const NET_ACTIVE_WINDOW: &str = "_NET_ACTIVE_WINDOW";

// ── Connection options ────────────────────────────────────────────────────────

/// How to open the X display.
#[derive(Clone, Default)]
pub struct X11Options {
    /// Display name such as `":0"`; `None` uses `$DISPLAY`.
    pub display: Option<String>,
    /// Receives asynchronous protocol errors for this connection.  Errors are
    /// always logged at `debug` whether or not a sink is installed.
    pub error_sink: Option<ErrorSink>,
}

impl std::fmt::Debug for X11Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Options")
            .field("display", &self.display)
            .field("error_sink", &self.error_sink.is_some())
            .finish()
    }
}

// ── Native API seam ───────────────────────────────────────────────────────────

/// A property buffer returned by `XGetWindowProperty`.
pub trait PropertyData {
    /// Item width reported by the server: 8, 16 or 32.
    fn format(&self) -> i32;

    /// The returned items as laid out in client memory.  Format-32 items
    /// occupy one C `long` each.
    fn bytes(&self) -> &[u8];
}

/// An image returned by `XGetImage`.
pub trait ImageData {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Stride between rows; may exceed `width * bytes_per_pixel`.
    fn bytes_per_line(&self) -> usize;
    fn bits_per_pixel(&self) -> u32;
    fn bytes(&self) -> &[u8];
}

/// Events this adapter synthesizes.
///
/// The real implementation fills an `XEvent` from these; `window` doubles as
/// the `root` field, and `same_screen` is always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    KeyPress { window: Xid, keycode: u8, state: u32 },
    ButtonPress { window: Xid, x: i32, y: i32, button: u32 },
    ButtonRelease { window: Xid, x: i32, y: i32, button: u32 },
}

/// The Xlib calls the adapter depends on.
///
/// Allocating calls return owned values that must be handed back to the
/// matching release call exactly once.
pub trait XlibApi {
    type Property: PropertyData;
    type Children: AsRef<[Xid]>;
    type Image: ImageData;

    fn root_window(&self) -> Xid;

    /// `XInternAtom(display, name, False)`.
    fn intern_atom(&self, name: &str) -> Atom;

    /// `XGetWindowProperty` with `AnyPropertyType`.  `None` when the window
    /// has no such property or the request failed.
    fn get_window_property(&self, window: Xid, property: Atom, max_items: i64)
        -> Option<Self::Property>;

    /// `XFree` on a property buffer.
    fn free_property(&self, property: Self::Property);

    /// `XQueryTree`: the direct children of `window`, bottom-most first.
    fn query_tree(&self, window: Xid) -> Option<Self::Children>;

    /// `XFree` on a child list.
    fn free_children(&self, children: Self::Children);

    /// `XGetWindowAttributes`: position relative to the parent, and size.
    fn window_attributes(&self, window: Xid) -> Option<Rect>;

    /// `XGetImage` on `window` as the drawable.
    fn get_image(&self, window: Xid, region: Rect, plane_mask: u64, format: i32)
        -> Option<Self::Image>;

    /// `XDestroyImage`.
    fn destroy_image(&self, image: Self::Image);

    /// `XKeysymToKeycode`; 0 when the keysym is not on the keyboard map.
    fn keysym_to_keycode(&self, keysym: u64) -> u8;

    /// `XSendEvent`; `false` if Xlib could not convert the event.
    fn send_event(&self, window: Xid, propagate: bool, event_mask: i64, event: &SyntheticEvent)
        -> bool;

    /// `XWarpPointer` with no source window.
    fn warp_pointer(&self, dest: Xid, x: i32, y: i32);

    /// `XFlush`.
    fn flush(&self);
}

// ── Property decoding ─────────────────────────────────────────────────────────

/// Interned atoms for the EWMH properties this adapter reads.
#[derive(Debug, Clone, Copy)]
struct Atoms {
    net_wm_name: Atom,
    net_wm_pid: Atom,
    net_active_window: Atom,
}

impl Atoms {
    fn intern<A: XlibApi>(api: &A) -> Self {
        Self {
            net_wm_name: api.intern_atom(NET_WM_NAME),
            net_wm_pid: api.intern_atom(NET_WM_PID),
            net_active_window: api.intern_atom(NET_ACTIVE_WINDOW),
        }
    }
}

/// Reads one property and decodes it while the buffer is alive.
///
/// The buffer is freed whether `decode` succeeds or not.
fn read_property<A, R>(
    api: &A,
    window: Xid,
    atom: Atom,
    decode: impl FnOnce(&A::Property) -> Option<R>,
) -> Option<R>
where
    A: XlibApi,
{
    let prop = api.get_window_property(window, atom, PROPERTY_MAX_ITEMS)?;
    let prop = Guard::new(prop, |p| api.free_property(p));
    decode(&*prop)
}

/// First item of a format-32 property, as a C `long`.
fn decode_long(prop: &impl PropertyData) -> Option<i64> {
    const LONG_SIZE: usize = std::mem::size_of::<c_long>();
    if prop.format() != 32 {
        return None;
    }
    let raw: [u8; LONG_SIZE] = prop.bytes().get(..LONG_SIZE)?.try_into().ok()?;
    Some(i64::from(c_long::from_ne_bytes(raw)))
}

/// Text up to the first NUL, lossily decoded as UTF-8.  Empty text is `None`.
fn decode_text(prop: &impl PropertyData) -> Option<String> {
    if prop.format() != 8 {
        return None;
    }
    let bytes = prop.bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Copies a 32-bpp image row by row into a tightly packed buffer.
fn copy_pixels(image: &impl ImageData) -> Result<Image, DsiError> {
    let bits_per_pixel = image.bits_per_pixel();
    if bits_per_pixel != 32 {
        return Err(DsiError::UnsupportedPixelFormat { bits_per_pixel });
    }
    let (width, height) = (image.width(), image.height());
    let row_len = width as usize * 4;
    let stride = image.bytes_per_line();
    if stride < row_len {
        return Err(DsiError::CaptureFailed(format!(
            "image stride {stride} is shorter than a {width}-pixel row"
        )));
    }

    let src = image.bytes();
    let mut data = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let row = src.get(start..start + row_len).ok_or_else(|| {
            DsiError::CaptureFailed(format!("image payload ends before row {y}"))
        })?;
        data.extend_from_slice(row);
    }
    Image::new(data, width, height, ChannelOrder::Bgra)
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// X11 implementation of [`Backend`].
///
/// Holds the one display connection for the process lifetime; every window
/// handed out shares it.
pub struct X11Backend<A: XlibApi> {
    api: Rc<A>,
    atoms: Atoms,
}

impl<A: XlibApi> X11Backend<A> {
    /// Wraps an open connection and interns the EWMH atoms.
    pub fn new(api: A) -> Self {
        let atoms = Atoms::intern(&api);
        Self {
            api: Rc::new(api),
            atoms,
        }
    }

    /// The underlying connection.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// A handle for `xid`.  No round trip is made; the window may not exist.
    pub fn window(&self, xid: Xid) -> X11Window<A> {
        X11Window {
            xid,
            api: Rc::clone(&self.api),
            atoms: self.atoms,
        }
    }

    fn children_of(&self, window: Xid) -> Vec<Xid> {
        let api = &*self.api;
        match api.query_tree(window) {
            Some(children) => {
                let children = Guard::new(children, |c| api.free_children(c));
                let xids: &[Xid] = (*children).as_ref();
                xids.to_vec()
            }
            None => Vec::new(),
        }
    }
}

impl<A: XlibApi> Backend for X11Backend<A> {
    type Window = X11Window<A>;

    fn active_window(&self) -> Option<X11Window<A>> {
        let api = &*self.api;
        let xid = read_property(api, api.root_window(), self.atoms.net_active_window, |p| {
            decode_long(p).and_then(|v| Xid::try_from(v).ok())
        })?;
        (xid != 0).then(|| self.window(xid))
    }

    /// Every descendant of the root window, level by level: all children of
    /// the root, then all grandchildren, and so on.  The root itself is not
    /// included.
    fn all_windows(&self) -> Vec<X11Window<A>> {
        let mut all = Vec::new();
        let mut level = self.children_of(self.api.root_window());
        while !level.is_empty() {
            let next: Vec<Xid> = level.iter().flat_map(|&xid| self.children_of(xid)).collect();
            all.append(&mut level);
            level = next;
        }
        debug!(count = all.len(), "enumerated X11 window tree");
        all.into_iter().map(|xid| self.window(xid)).collect()
    }
}

// ── Window ────────────────────────────────────────────────────────────────────

/// A window on the X server, addressed by XID.
pub struct X11Window<A: XlibApi> {
    xid: Xid,
    api: Rc<A>,
    atoms: Atoms,
}

impl<A: XlibApi> Clone for X11Window<A> {
    fn clone(&self) -> Self {
        Self {
            xid: self.xid,
            api: Rc::clone(&self.api),
            atoms: self.atoms,
        }
    }
}

impl<A: XlibApi> std::fmt::Debug for X11Window<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Window").field("xid", &format_args!("{:#x}", self.xid)).finish()
    }
}

impl<A: XlibApi> X11Window<A> {
    pub fn xid(&self) -> Xid {
        self.xid
    }

    fn send_keysym(&self, keysym: u32, state: u32) -> Result<(), DsiError> {
        let keycode = self.api.keysym_to_keycode(u64::from(keysym));
        if keycode == 0 {
            return Err(DsiError::UnknownKey(format!("keysym {keysym:#x}")));
        }
        let event = SyntheticEvent::KeyPress {
            window: self.xid,
            keycode,
            state,
        };
        self.dispatch(KEY_PRESS_MASK, &event);
        Ok(())
    }

    /// Sends `event` to this window and flushes the output buffer.
    fn dispatch(&self, event_mask: i64, event: &SyntheticEvent) {
        trace!(window = self.xid, ?event, "XSendEvent");
        if !self.api.send_event(self.xid, true, event_mask, event) {
            debug!(window = self.xid, ?event, "XSendEvent could not convert event");
        }
        self.api.flush();
    }
}

impl<A: XlibApi> Window for X11Window<A> {
    fn handle(&self) -> u64 {
        self.xid
    }

    fn name(&self) -> Option<String> {
        read_property(&*self.api, self.xid, self.atoms.net_wm_name, |p| decode_text(p))
    }

    fn pid(&self) -> Option<u32> {
        read_property(&*self.api, self.xid, self.atoms.net_wm_pid, |p| {
            decode_long(p).and_then(|v| u32::try_from(v).ok())
        })
    }

    fn active(&self) -> bool {
        let api = &*self.api;
        read_property(api, api.root_window(), self.atoms.net_active_window, |p| {
            decode_long(p).and_then(|v| Xid::try_from(v).ok())
        }) == Some(self.xid)
    }

    fn geometry(&self) -> Option<Rect> {
        self.api.window_attributes(self.xid)
    }

    /// `region` is in window coordinates; `None` captures the whole window
    /// from its origin.
    fn capture(&self, region: Option<Rect>) -> Result<Image, DsiError> {
        let region = match region {
            Some(region) => region,
            None => {
                let geometry = self.geometry().ok_or(DsiError::WindowUnavailable(self.xid))?;
                Rect::new(0, 0, geometry.width, geometry.height)
            }
        };

        let api = &*self.api;
        let Some(image) = api.get_image(self.xid, region, PLANE_MASK_RGB, ZPIXMAP) else {
            warn!(window = self.xid, %region, "XGetImage returned no image");
            return Err(DsiError::CaptureFailed(format!(
                "XGetImage failed for window {:#x} at {region}",
                self.xid
            )));
        };
        let image = Guard::new(image, |img| api.destroy_image(img));
        copy_pixels(&*image)
    }

    fn send_character(&self, ch: char) -> Result<(), DsiError> {
        let keysym = KeyMapper::char_to_x11_keysym(ch)
            .ok_or_else(|| DsiError::UnknownKey(ch.escape_unicode().to_string()))?;
        let state = if ch.is_uppercase() { SHIFT_MASK } else { 0 };
        self.send_keysym(keysym, state)
    }

    fn send_key(&self, key: Key) -> Result<(), DsiError> {
        self.send_keysym(KeyMapper::key_to_x11_keysym(key), 0)
    }

    /// Without a region the pointer moves relative to this window; with one
    /// it moves to `(region.x + x, region.y + y)` on the root window.
    fn warp_pointer(&self, x: i32, y: i32, region: Option<Rect>) -> Result<(), DsiError> {
        let (dest, x, y) = match region {
            Some(r) => (self.api.root_window(), r.x + x, r.y + y),
            None => (self.xid, x, y),
        };
        trace!(dest, x, y, "XWarpPointer");
        self.api.warp_pointer(dest, x, y);
        self.api.flush();
        Ok(())
    }

    fn send_click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), DsiError> {
        let button = button.x11_button();
        let window = self.xid;
        self.dispatch(
            BUTTON_PRESS_MASK,
            &SyntheticEvent::ButtonPress { window, x, y, button },
        );
        self.dispatch(
            BUTTON_RELEASE_MASK,
            &SyntheticEvent::ButtonRelease { window, x, y, button },
        );
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
