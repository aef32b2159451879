//! Win32 backend adapter.
//!
//! Windows are identified by `HWND`s.  Attributes come from User32 queries,
//! pixels from a GDI blit into a memory bitmap, and input from messages
//! posted to the window's queue.
//!
//! Like the X11 adapter, the logic here is written against a narrow trait,
//! [`Win32Api`], so it compiles and is tested on every platform:
//!
//! | Module   | Compiled on | Purpose                                        |
//! |----------|-------------|------------------------------------------------|
//! | `user32` | Windows     | Real calls through the `windows` crate         |
//! | `mock`   | everywhere  | Recording fake used by unit/integration tests  |
//!
//! # Capture resource order
//!
//! ```text
//! GetDC(hwnd) ─► CreateCompatibleDC ─► CreateCompatibleBitmap ─► SelectObject
//!                                                                   │
//!                                       BitBlt ─► GetBitmapBits ◄───┘
//!
//! release: SelectObject(previous) ─► DeleteObject(bitmap) ─► DeleteDC ─► ReleaseDC
//! ```
//!
//! Each handle is wrapped in a [`Guard`] as soon as it exists, so the release
//! chain runs from whatever point the capture stopped at.  The selection is
//! undone first because GDI refuses to delete a bitmap that is still selected
//! into a DC.

#[cfg(target_os = "windows")]
pub mod user32;

pub mod mock;

use std::rc::Rc;

use dsi_core::{ChannelOrder, DsiError, Image, Key, KeyMapper, MouseButton, Rect, Window};
use tracing::{debug, trace, warn};

use crate::application::facade::Backend;
use crate::infrastructure::guard::Guard;

// ── Handles ───────────────────────────────────────────────────────────────────

/// Window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hwnd(pub isize);

/// Device context handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hdc(pub isize);

/// Bitmap handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hbitmap(pub isize);

/// Handle of whatever GDI object a DC had selected before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hgdiobj(pub isize);

/// A Win32 `RECT`: edges, not origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WinRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WinRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

// ── Message constants ─────────────────────────────────────────────────────────

pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_CHAR: u32 = 0x0102;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_XBUTTONDOWN: u32 = 0x020B;
pub const WM_XBUTTONUP: u32 = 0x020C;

const MK_LBUTTON: usize = 0x0001;
const MK_RBUTTON: usize = 0x0002;
const MK_MBUTTON: usize = 0x0010;
const MK_XBUTTON1: usize = 0x0020;
const MK_XBUTTON2: usize = 0x0040;
const XBUTTON1: usize = 0x0001;
const XBUTTON2: usize = 0x0002;

/// Key-down lParam: repeat count 1.
pub const KEYDOWN_LPARAM: isize = 1;
/// Key-up lParam: repeat count 1, previous state down, transition state up.
pub const KEYUP_LPARAM: isize = 0xC000_0001_u32 as isize;

/// `GetWindowTextW` scratch size in UTF-16 units; longer titles are truncated.
pub const TITLE_BUFFER_LEN: usize = 1024;

/// Message pair and wParams for one button.
struct ButtonMessages {
    down: u32,
    up: u32,
    down_wparam: usize,
    up_wparam: usize,
}

fn button_messages(button: MouseButton) -> ButtonMessages {
    match button {
        MouseButton::Left => ButtonMessages {
            down: WM_LBUTTONDOWN,
            up: WM_LBUTTONUP,
            down_wparam: MK_LBUTTON,
            up_wparam: 0,
        },
        MouseButton::Right => ButtonMessages {
            down: WM_RBUTTONDOWN,
            up: WM_RBUTTONUP,
            down_wparam: MK_RBUTTON,
            up_wparam: 0,
        },
        MouseButton::Middle => ButtonMessages {
            down: WM_MBUTTONDOWN,
            up: WM_MBUTTONUP,
            down_wparam: MK_MBUTTON,
            up_wparam: 0,
        },
        MouseButton::Backward => ButtonMessages {
            down: WM_XBUTTONDOWN,
            up: WM_XBUTTONUP,
            down_wparam: MK_XBUTTON1 | (XBUTTON1 << 16),
            up_wparam: XBUTTON1 << 16,
        },
        MouseButton::Forward => ButtonMessages {
            down: WM_XBUTTONDOWN,
            up: WM_XBUTTONUP,
            down_wparam: MK_XBUTTON2 | (XBUTTON2 << 16),
            up_wparam: XBUTTON2 << 16,
        },
    }
}

/// Packs client coordinates into a mouse-message lParam (`MAKELPARAM(x, y)`).
pub fn point_lparam(x: i32, y: i32) -> isize {
    (((y as u32 & 0xFFFF) << 16) | (x as u32 & 0xFFFF)) as isize
}

// ── Native API seam ───────────────────────────────────────────────────────────

/// The User32/GDI calls the adapter depends on.
///
/// Calls that create a handle return `None` on failure.  Every handle
/// returned must be passed to its release call exactly once.
pub trait Win32Api {
    /// `EnumWindows`: calls `visit` for every top-level window until it
    /// returns `false`.
    fn enum_windows(&self, visit: &mut dyn FnMut(Hwnd) -> bool);

    /// `GetWindowTextW` into `buf`; returns the number of units written.
    fn window_text(&self, hwnd: Hwnd, buf: &mut [u16]) -> usize;

    /// `GetWindowThreadProcessId`.
    fn window_process_id(&self, hwnd: Hwnd) -> Option<u32>;

    /// `GetForegroundWindow`; `None` while focus is changing.
    fn foreground_window(&self) -> Option<Hwnd>;

    /// `GetWindowRect`: outer frame in screen coordinates.
    fn window_rect(&self, hwnd: Hwnd) -> Option<WinRect>;

    /// `GetClientRect`: client area, origin always `(0, 0)`.
    fn client_rect(&self, hwnd: Hwnd) -> Option<WinRect>;

    fn get_dc(&self, hwnd: Hwnd) -> Option<Hdc>;
    fn release_dc(&self, hwnd: Hwnd, hdc: Hdc);

    fn create_compatible_dc(&self, hdc: Hdc) -> Option<Hdc>;
    fn delete_dc(&self, hdc: Hdc);

    fn create_compatible_bitmap(&self, hdc: Hdc, width: i32, height: i32) -> Option<Hbitmap>;
    fn delete_bitmap(&self, bitmap: Hbitmap);

    /// `SelectObject`; returns the object previously selected into `hdc`.
    fn select_bitmap(&self, hdc: Hdc, bitmap: Hbitmap) -> Option<Hgdiobj>;
    fn restore_selection(&self, hdc: Hdc, previous: Hgdiobj);

    /// `BitBlt(dest, 0, 0, width, height, src, src_x, src_y, SRCCOPY)`.
    fn bit_blt(&self, dest: Hdc, width: i32, height: i32, src: Hdc, src_x: i32, src_y: i32) -> bool;

    /// `GetBitmapBits` into `buf`; returns the number of bytes copied.
    fn bitmap_bits(&self, bitmap: Hbitmap, buf: &mut [u8]) -> usize;

    /// `PostMessageW`.
    fn post_message(&self, hwnd: Hwnd, msg: u32, wparam: usize, lparam: isize) -> bool;

    /// `SetCursorPos` in screen coordinates.
    fn set_cursor_pos(&self, x: i32, y: i32) -> bool;
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Win32 implementation of [`Backend`].
pub struct Win32Backend<A: Win32Api> {
    api: Rc<A>,
}

impl<A: Win32Api> Win32Backend<A> {
    pub fn new(api: A) -> Self {
        Self { api: Rc::new(api) }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A handle for `hwnd`.  No call is made; the window may not exist.
    pub fn window(&self, hwnd: Hwnd) -> Win32Window<A> {
        Win32Window {
            hwnd,
            api: Rc::clone(&self.api),
        }
    }
}

impl<A: Win32Api> Backend for Win32Backend<A> {
    type Window = Win32Window<A>;

    fn active_window(&self) -> Option<Win32Window<A>> {
        self.api.foreground_window().map(|hwnd| self.window(hwnd))
    }

    /// Top-level windows in the order `EnumWindows` reports them.
    fn all_windows(&self) -> Vec<Win32Window<A>> {
        let mut hwnds = Vec::new();
        self.api.enum_windows(&mut |hwnd| {
            hwnds.push(hwnd);
            true
        });
        debug!(count = hwnds.len(), "enumerated top-level windows");
        hwnds.into_iter().map(|hwnd| self.window(hwnd)).collect()
    }
}

// ── Window ────────────────────────────────────────────────────────────────────

/// A top-level window addressed by `HWND`.
pub struct Win32Window<A: Win32Api> {
    hwnd: Hwnd,
    api: Rc<A>,
}

impl<A: Win32Api> Clone for Win32Window<A> {
    fn clone(&self) -> Self {
        Self {
            hwnd: self.hwnd,
            api: Rc::clone(&self.api),
        }
    }
}

impl<A: Win32Api> std::fmt::Debug for Win32Window<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Win32Window").field("hwnd", &format_args!("{:#x}", self.hwnd.0)).finish()
    }
}

impl<A: Win32Api> Win32Window<A> {
    pub fn hwnd(&self) -> Hwnd {
        self.hwnd
    }

    fn unavailable(&self) -> DsiError {
        DsiError::WindowUnavailable(self.hwnd.0 as u64)
    }

    fn post(&self, msg: u32, wparam: usize, lparam: isize) -> Result<(), DsiError> {
        trace!(
        hwnd = self.hwnd.0,
        msg = %format_args!("{msg:#06x}"),
        wparam,
        lparam,
        "PostMessageW"
    );
        if self.api.post_message(self.hwnd, msg, wparam, lparam) {
            Ok(())
        } else {
            Err(self.unavailable())
        }
    }

    fn post_key(&self, vk: u8) -> Result<(), DsiError> {
        self.post(WM_KEYDOWN, usize::from(vk), KEYDOWN_LPARAM)?;
        self.post(WM_KEYUP, usize::from(vk), KEYUP_LPARAM)
    }

    /// Blits `target` into a memory bitmap and copies its bits out.  Every
    /// GDI handle is released before this returns.
    fn blit_to_buffer(&self, target: Rect, src_x: i32, src_y: i32) -> Result<Vec<u8>, DsiError> {
        let api = &*self.api;
        let hwnd = self.hwnd;
        let failed = |call: &str| {
            warn!(hwnd = hwnd.0, %target, call, "window capture failed");
            DsiError::CaptureFailed(format!("{call} failed for window {:#x}", hwnd.0))
        };

        let window_dc = api.get_dc(hwnd).ok_or_else(|| failed("GetDC"))?;
        let window_dc = Guard::new(window_dc, |dc| api.release_dc(hwnd, dc));

        let memory_dc = api
        .create_compatible_dc(*window_dc)
        .ok_or_else(|| failed("CreateCompatibleDC"))?;
        let memory_dc = Guard::new(memory_dc, |dc| api.delete_dc(dc));

        let bitmap = api
            .create_compatible_bitmap(*window_dc, target.width, target.height)
            .ok_or_else(|| failed("CreateCompatibleBitmap"))?;
        let bitmap = Guard::new(bitmap, |bmp| api.delete_bitmap(bmp));

        let selected_into = *memory_dc;
        let previous = api
        .select_bitmap(selected_into, *bitmap)
        .ok_or_else(|| failed("SelectObject"))?;
        let _selection =
        Guard::new(previous, move |prev| api.restore_selection(selected_into, prev));

        if !api.bit_blt(*memory_dc, target.width, target.height, *window_dc, src_x, src_y) {
            return Err(failed("BitBlt"));
        }

        let mut data = vec![0u8; target.pixel_bytes()];
        let copied = api.bitmap_bits(*bitmap, &mut data);
        if copied != data.len() {
            return Err(failed("GetBitmapBits"));
        }
        Ok(data)
    }
}

impl<A: Win32Api> Window for Win32Window<A> {
    fn handle(&self) -> u64 {
        self.hwnd.0 as u64
    }

    /// `None` for an untitled window.
    fn name(&self) -> Option<String> {
        let mut buf = [0u16; TITLE_BUFFER_LEN];
        let len = self.api.window_text(self.hwnd, &mut buf).min(TITLE_BUFFER_LEN);
        (len > 0).then(|| String::from_utf16_lossy(&buf[..len]))
    }

    fn pid(&self) -> Option<u32> {
        self.api.window_process_id(self.hwnd)
    }

    fn active(&self) -> bool {
        self.api.foreground_window() == Some(self.hwnd)
    }

    /// The client area in screen coordinates: the frame's left edge, the
    /// frame's top edge pushed down by the title bar, and the client size.
    fn geometry(&self) -> Option<Rect> {
        let outer = self.api.window_rect(self.hwnd)?;
        let client = self.api.client_rect(self.hwnd)?;
        let title_bar_height = outer.height() - client.height();
        Some(Rect::new(
            outer.left,
            outer.top + title_bar_height,
            client.width(),
            client.height(),
        ))
    }

    /// `region` is in screen coordinates; it is blitted from the window DC at
    /// its offset from the window's own geometry.
    fn capture(&self, region: Option<Rect>) -> Result<Image, DsiError> {
        let own = self.geometry().ok_or_else(|| self.unavailable())?;
        let target = region.unwrap_or(own);
        let (Ok(width), Ok(height)) = (u32::try_from(target.width), u32::try_from(target.height))
        else {
            return Err(DsiError::CaptureFailed(format!(
                "negative capture size {}x{}",
                target.width, target.height
            )));
        };
        let (src_x, src_y) = target.offset_from(&own);

        let data = self.blit_to_buffer(target, src_x, src_y)?;
        Image::new(data, width, height, ChannelOrder::Bgra)
    }

    /// Control characters with a dedicated key are sent as a key-down/key-up
    /// pair; everything else as one `WM_CHAR` per UTF-16 unit.
    fn send_character(&self, ch: char) -> Result<(), DsiError> {
        if let Some(vk) = KeyMapper::char_to_windows_vk(ch) {
            return self.post_key(vk);
        }
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            self.post(WM_CHAR, usize::from(*unit), KEYDOWN_LPARAM)?;
        }
        Ok(())
    }

    fn send_key(&self, key: Key) -> Result<(), DsiError> {
        self.post_key(KeyMapper::key_to_windows_vk(key))
    }

    fn warp_pointer(&self, x: i32, y: i32, region: Option<Rect>) -> Result<(), DsiError> {
        let base = match region {
            Some(region) => region,
            None => self.geometry().ok_or_else(|| self.unavailable())?,
        };
        let (sx, sy) = (x + base.x, y + base.y);
        trace!(x = sx, y = sy, "SetCursorPos");
        if self.api.set_cursor_pos(sx, sy) {
            Ok(())
        } else {
            Err(DsiError::InputFailed(format!("SetCursorPos({sx}, {sy}) failed")))
        }
    }

    fn send_click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), DsiError> {
        let msgs = button_messages(button);
        let lparam = point_lparam(x, y);
        self.post(msgs.down, msgs.down_wparam, lparam)?;
        self.post(msgs.up, msgs.up_wparam, lparam)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::mock::{GdiCall, MockWin32};
    use super::*;

    const HWND: Hwnd = Hwnd(0x1234);

    fn framed(mock: MockWin32) -> MockWin32 {
        // 800x600 client area under a 30px title bar and 8px borders
        mock.with_window(HWND)
            .with_window_rect(HWND, WinRect::new(100, 50, 916, 688))
            .with_client_rect(HWND, WinRect::new(0, 0, 800, 600))
    }

    #[test]
    fn test_geometry_offsets_top_by_title_bar() {
        let b = Win32Backend::new(framed(MockWin32::new()));
        assert_eq!(b.window(HWND).geometry(), Some(Rect::new(100, 88, 800, 600)));
    }

    #[test]
    fn test_geometry_of_vanished_window_is_none() {
        let b = Win32Backend::new(MockWin32::new());
        assert_eq!(b.window(HWND).geometry(), None);
    }

    #[test]
    fn test_empty_title_is_none() {
        let b = Win32Backend::new(MockWin32::new().with_title(HWND, ""));
        assert_eq!(b.window(HWND).name(), None);
    }

    #[test]
    fn test_long_title_is_truncated_to_buffer() {
        let long = "x".repeat(TITLE_BUFFER_LEN + 50);
        let b = Win32Backend::new(MockWin32::new().with_title(HWND, &long));
        assert_eq!(b.window(HWND).name().map(|n| n.len()), Some(TITLE_BUFFER_LEN - 1));
    }

    #[test]
    fn test_active_compares_foreground() {
        let b = Win32Backend::new(MockWin32::new().with_foreground(HWND));
        assert!(b.window(HWND).active());
        assert!(!b.window(Hwnd(0x99)).active());
        assert_eq!(b.active_window().map(|w| w.hwnd()), Some(HWND));
    }

    #[test]
    fn test_all_windows_preserves_enumeration_order() {
        let mock = MockWin32::new()
            .with_window(Hwnd(3))
            .with_window(Hwnd(1))
            .with_window(Hwnd(2));
        let b = Win32Backend::new(mock);
        let order: Vec<Hwnd> = b.all_windows().iter().map(|w| w.hwnd()).collect();
        assert_eq!(order, vec![Hwnd(3), Hwnd(1), Hwnd(2)]);
    }

    #[test]
    fn test_capture_releases_in_reverse_order() {
        // Arrange
        let b = Win32Backend::new(framed(MockWin32::new()));

        // Act
        let img = b.window(HWND).capture(Some(Rect::new(110, 98, 4, 2))).expect("capture");

        // Assert
        assert_eq!((img.width(), img.height()), (4, 2));
        let calls = b.api().gdi_calls();
        let names: Vec<&str> = calls.iter().map(GdiCall::name).collect();
        assert_eq!(
            names,
            vec![
                "GetDC",
                "CreateCompatibleDC",
                "CreateCompatibleBitmap",
                "SelectObject",
                "BitBlt",
                "GetBitmapBits",
                "RestoreSelection",
                "DeleteObject",
                "DeleteDC",
                "ReleaseDC",
            ]
        );
    }

    #[test]
    fn test_capture_blits_from_offset_within_window() {
        let b = Win32Backend::new(framed(MockWin32::new()));
        b.window(HWND).capture(Some(Rect::new(110, 98, 4, 2))).expect("capture");
        assert!(b
            .api()
            .gdi_calls()
            .iter()
            .any(|c| matches!(
            c,
            GdiCall::BitBlt { width: 4, height: 2, src_x: 10, src_y: 10, .. }
        )));
    }

    #[test]
    fn test_capture_blit_failure_still_releases_everything() {
        // Arrange
        let mut mock = framed(MockWin32::new());
        mock.fail_blit = true;
        let b = Win32Backend::new(mock);

        // Act
        let err = b.window(HWND).capture(None).unwrap_err();

        // Assert
        assert!(matches!(err, DsiError::CaptureFailed(_)));
        assert_eq!(b.api().allocations(), 3);
        assert_eq!(b.api().releases(), 3);
        assert_eq!(b.api().outstanding(), 0);
    }

    #[test]
    fn test_capture_bitmap_creation_failure_releases_dcs() {
        let mut mock = framed(MockWin32::new());
        mock.fail_bitmap = true;
        let b = Win32Backend::new(mock);

        assert!(b.window(HWND).capture(None).is_err());
        assert_eq!(b.api().allocations(), 2);
        assert_eq!(b.api().outstanding(), 0);
    }

    #[test]
    fn test_send_character_printable_posts_wm_char() {
        let b = Win32Backend::new(MockWin32::new());
        b.window(HWND).send_character('h').expect("send");
        assert_eq!(b.api().messages(), vec![(HWND, WM_CHAR, 'h' as usize, 1)]);
    }

    #[test]
    fn test_send_character_astral_posts_surrogate_pair() {
        let b = Win32Backend::new(MockWin32::new());
        b.window(HWND).send_character('😀').expect("send");
        let units: Vec<usize> = b.api().messages().iter().map(|m| m.2).collect();
        assert_eq!(units, vec![0xD83D, 0xDE00]);
    }

    #[test]
    fn test_send_character_newline_posts_return_key_pair() {
        let b = Win32Backend::new(MockWin32::new());
        b.window(HWND).send_character('\n').expect("send");
        assert_eq!(
            b.api().messages(),
            vec![
                (HWND, WM_KEYDOWN, 0x0D, KEYDOWN_LPARAM),
                (HWND, WM_KEYUP, 0x0D, KEYUP_LPARAM),
            ]
        );
    }

    #[test]
    fn test_send_click_right_posts_down_then_up() {
        let b = Win32Backend::new(MockWin32::new());
        b.window(HWND).send_click(100, 100, MouseButton::Right).expect("click");
        let lparam = point_lparam(100, 100);
        assert_eq!(
            b.api().messages(),
            vec![
                (HWND, WM_RBUTTONDOWN, MK_RBUTTON, lparam),
                (HWND, WM_RBUTTONUP, 0, lparam),
            ]
        );
    }

    #[test]
    fn test_send_click_forward_uses_xbutton2() {
        let b = Win32Backend::new(MockWin32::new());
        b.window(HWND).send_click(1, 2, MouseButton::Forward).expect("click");
        let msgs = b.api().messages();
        assert_eq!(msgs[0].1, WM_XBUTTONDOWN);
        assert_eq!(msgs[0].2 >> 16, XBUTTON2);
        assert_eq!(msgs[1].1, WM_XBUTTONUP);
    }

    #[test]
    fn test_point_lparam_packs_low_and_high_words() {
        assert_eq!(point_lparam(100, 200), (200 << 16) | 100);
        assert_eq!(point_lparam(-1, 0), 0xFFFF);
    }

    #[test]
    fn test_post_failure_is_window_unavailable() {
        let mut mock = MockWin32::new();
        mock.fail_post = true;
        let b = Win32Backend::new(mock);
        assert_eq!(
            b.window(HWND).send_character('a'),
            Err(DsiError::WindowUnavailable(0x1234))
        );
    }

    #[test]
    fn test_warp_pointer_adds_region_origin() {
        let b = Win32Backend::new(framed(MockWin32::new()));
        b.window(HWND).warp_pointer(5, 6, None).expect("warp");
        b.window(HWND)
            .warp_pointer(5, 6, Some(Rect::new(100, 200, 300, 400)))
            .expect("warp");
        assert_eq!(b.api().cursor_moves(), vec![(105, 94), (105, 206)]);
    }

    #[test]
    fn test_refused_cursor_move_is_input_failure() {
        // Arrange
        let mut mock = framed(MockWin32::new());
        mock.fail_cursor = true;
        let b = Win32Backend::new(mock);

        // Act
        let result = b.window(HWND).warp_pointer(5, 6, None);

        // Assert
        assert!(matches!(result, Err(DsiError::InputFailed(_))));
    }

    #[test]
    fn test_negative_region_fails_before_touching_gdi() {
        // Arrange
        let b = Win32Backend::new(framed(MockWin32::new()));

        // Act
        let result = b.window(HWND).capture(Some(Rect::new(110, 98, -4, 2)));

        // Assert
        assert!(matches!(result, Err(DsiError::CaptureFailed(_))));
        assert!(b.api().gdi_calls().is_empty());
    }
}
