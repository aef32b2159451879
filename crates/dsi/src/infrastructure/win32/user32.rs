//! User32/GDI implementation of [`Win32Api`] via the `windows` crate.
//!
//! The adapter's handle newtypes carry the raw handle value; they are turned
//! back into `windows` handle types at each call.

use std::ffi::c_void;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetBitmapBits,
    GetDC, ReleaseDC, SelectObject, HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClientRect, GetForegroundWindow, GetWindowRect, GetWindowTextW,
    GetWindowThreadProcessId, PostMessageW, SetCursorPos,
};

use super::{Hbitmap, Hdc, Hgdiobj, Hwnd, WinRect, Win32Api, Win32Backend};

/// The live Win32 API.  Stateless: every handle belongs to the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct User32;

impl Win32Backend<User32> {
    /// The native backend.  Win32 needs no connection, so this cannot fail.
    pub fn native() -> Self {
        tracing::info!("using Win32 backend");
        Self::new(User32)
    }
}

fn hwnd(h: Hwnd) -> HWND {
    HWND(h.0 as *mut c_void)
}

fn hdc(h: Hdc) -> HDC {
    HDC(h.0 as *mut c_void)
}

fn hbitmap(h: Hbitmap) -> HBITMAP {
    HBITMAP(h.0 as *mut c_void)
}

fn win_rect(rc: RECT) -> WinRect {
    WinRect::new(rc.left, rc.top, rc.right, rc.bottom)
}

/// `EnumWindows` callback.
///
/// # Safety
///
/// `lparam` must point to a live `&mut dyn FnMut(Hwnd) -> bool` for the
/// duration of the enumeration.  The callback runs synchronously inside
/// `EnumWindows` on the calling thread.
unsafe extern "system" fn enum_windows_proc(handle: HWND, lparam: LPARAM) -> BOOL {
    let visit = &mut *(lparam.0 as *mut &mut dyn FnMut(Hwnd) -> bool);
    BOOL::from(visit(Hwnd(handle.0 as isize)))
}

impl Win32Api for User32 {
    fn enum_windows(&self, visit: &mut dyn FnMut(Hwnd) -> bool) {
        let mut visit = visit;
        // SAFETY: `visit` outlives the call, and `enum_windows_proc` casts
        // the pointer back to the same type.  EnumWindows reports an error
        // when the visitor stops early, which is not a failure here.
        unsafe {
            let _ = EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut visit as *mut &mut dyn FnMut(Hwnd) -> bool as isize),
            );
        }
    }

    fn window_text(&self, h: Hwnd, buf: &mut [u16]) -> usize {
        // SAFETY: `buf` is a valid writable slice.
        let len = unsafe { GetWindowTextW(hwnd(h), buf) };
        usize::try_from(len).unwrap_or(0)
    }

    fn window_process_id(&self, h: Hwnd) -> Option<u32> {
        let mut pid = 0u32;
        // SAFETY: `pid` is a valid out-pointer.
        let thread = unsafe { GetWindowThreadProcessId(hwnd(h), Some(&mut pid)) };
        (thread != 0 && pid != 0).then_some(pid)
    }

    fn foreground_window(&self) -> Option<Hwnd> {
        // SAFETY: no arguments.
        let fg = unsafe { GetForegroundWindow() };
        (!fg.is_invalid()).then(|| Hwnd(fg.0 as isize))
    }

    fn window_rect(&self, h: Hwnd) -> Option<WinRect> {
        let mut rc = RECT::default();
        // SAFETY: `rc` is a valid out-pointer.
        unsafe { GetWindowRect(hwnd(h), &mut rc) }.ok()?;
        Some(win_rect(rc))
    }

    fn client_rect(&self, h: Hwnd) -> Option<WinRect> {
        let mut rc = RECT::default();
        // SAFETY: `rc` is a valid out-pointer.
        unsafe { GetClientRect(hwnd(h), &mut rc) }.ok()?;
        Some(win_rect(rc))
    }

    fn get_dc(&self, h: Hwnd) -> Option<Hdc> {
        // SAFETY: an invalid window yields a null DC, checked below.
        let dc = unsafe { GetDC(hwnd(h)) };
        (!dc.is_invalid()).then(|| Hdc(dc.0 as isize))
    }

    fn release_dc(&self, h: Hwnd, dc: Hdc) {
        // SAFETY: `dc` was returned by GetDC for `h`.
        unsafe {
            ReleaseDC(hwnd(h), hdc(dc));
        }
    }

    fn create_compatible_dc(&self, dc: Hdc) -> Option<Hdc> {
        // SAFETY: `dc` is a live window DC.
        let mem = unsafe { CreateCompatibleDC(hdc(dc)) };
        (!mem.is_invalid()).then(|| Hdc(mem.0 as isize))
    }

    fn delete_dc(&self, dc: Hdc) {
        // SAFETY: `dc` was created by CreateCompatibleDC.
        unsafe {
            let _ = DeleteDC(hdc(dc));
        }
    }

    fn create_compatible_bitmap(&self, dc: Hdc, width: i32, height: i32) -> Option<Hbitmap> {
        // SAFETY: `dc` is a live window DC.
        let bmp = unsafe { CreateCompatibleBitmap(hdc(dc), width, height) };
        (!bmp.is_invalid()).then(|| Hbitmap(bmp.0 as isize))
    }

    fn delete_bitmap(&self, bitmap: Hbitmap) {
        // SAFETY: `bitmap` was created by CreateCompatibleBitmap and is no
        // longer selected into a DC.
        unsafe {
            let _ = DeleteObject(HGDIOBJ::from(hbitmap(bitmap)));
        }
    }

    fn select_bitmap(&self, dc: Hdc, bitmap: Hbitmap) -> Option<Hgdiobj> {
        // SAFETY: both handles are live.
        let prev = unsafe { SelectObject(hdc(dc), HGDIOBJ::from(hbitmap(bitmap))) };
        (!prev.is_invalid()).then(|| Hgdiobj(prev.0 as isize))
    }

    fn restore_selection(&self, dc: Hdc, previous: Hgdiobj) {
        // SAFETY: `previous` was selected into `dc` before.
        unsafe {
            let _ = SelectObject(hdc(dc), HGDIOBJ(previous.0 as *mut c_void));
        }
    }

    fn bit_blt(
        &self,
        dest: Hdc,
        width: i32,
        height: i32,
        src: Hdc,
        src_x: i32,
        src_y: i32,
    ) -> bool {
        // SAFETY: both DCs are live.
        unsafe { BitBlt(hdc(dest), 0, 0, width, height, hdc(src), src_x, src_y, SRCCOPY) }.is_ok()
    }

    fn bitmap_bits(&self, bitmap: Hbitmap, buf: &mut [u8]) -> usize {
        let len = i32::try_from(buf.len()).unwrap_or(i32::MAX);
        // SAFETY: `buf` is writable for `len` bytes.
        let copied = unsafe { GetBitmapBits(hbitmap(bitmap), len, buf.as_mut_ptr().cast()) };
        usize::try_from(copied).unwrap_or(0)
    }

    fn post_message(&self, h: Hwnd, msg: u32, wparam: usize, lparam: isize) -> bool {
        // SAFETY: PostMessageW only queues; an invalid window is an error.
        unsafe { PostMessageW(hwnd(h), msg, WPARAM(wparam), LPARAM(lparam)) }.is_ok()
    }

    fn set_cursor_pos(&self, x: i32, y: i32) -> bool {
        // SAFETY: no pointers involved.
        unsafe { SetCursorPos(x, y) }.is_ok()
    }
}
