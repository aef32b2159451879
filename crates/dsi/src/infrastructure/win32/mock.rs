//! Recording fake of the User32/GDI surface for tests.
//!
//! `MockWin32` serves a configurable set of top-level windows with titles,
//! PIDs and rectangles.  Every GDI call is appended to an ordered log
//! ([`GdiCall`]) so tests can check both that each DC and bitmap is released
//! and the order the releases happen in.  Posted messages and cursor moves
//! are logged separately.
//!
//! The `fail_*` flags make the corresponding native call fail, to exercise
//! cleanup on the error paths.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Hbitmap, Hdc, Hgdiobj, Hwnd, WinRect, Win32Api};

/// One recorded GDI call.  Only successful creations are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdiCall {
    GetDc { hwnd: Hwnd, hdc: Hdc },
    ReleaseDc { hwnd: Hwnd, hdc: Hdc },
    CreateCompatibleDc { src: Hdc, hdc: Hdc },
    DeleteDc { hdc: Hdc },
    CreateCompatibleBitmap { hdc: Hdc, width: i32, height: i32, bitmap: Hbitmap },
    DeleteObject { bitmap: Hbitmap },
    SelectObject { hdc: Hdc, bitmap: Hbitmap },
    RestoreSelection { hdc: Hdc, previous: Hgdiobj },
    BitBlt { dest: Hdc, width: i32, height: i32, src: Hdc, src_x: i32, src_y: i32 },
    GetBitmapBits { bitmap: Hbitmap, copied: usize },
}

impl GdiCall {
    /// The Win32 function name, for order assertions.
    pub fn name(&self) -> &'static str {
        match self {
            GdiCall::GetDc { .. } => "GetDC",
            GdiCall::ReleaseDc { .. } => "ReleaseDC",
            GdiCall::CreateCompatibleDc { .. } => "CreateCompatibleDC",
            GdiCall::DeleteDc { .. } => "DeleteDC",
            GdiCall::CreateCompatibleBitmap { .. } => "CreateCompatibleBitmap",
            GdiCall::DeleteObject { .. } => "DeleteObject",
            GdiCall::SelectObject { .. } => "SelectObject",
            GdiCall::RestoreSelection { .. } => "RestoreSelection",
            GdiCall::BitBlt { .. } => "BitBlt",
            GdiCall::GetBitmapBits { .. } => "GetBitmapBits",
        }
    }

    fn is_allocation(&self) -> bool {
        matches!(
            self,
            GdiCall::GetDc { .. }
            | GdiCall::CreateCompatibleDc { .. }
            | GdiCall::CreateCompatibleBitmap { .. }
        )
    }

    fn is_release(&self) -> bool {
        matches!(
            self,
            GdiCall::ReleaseDc { .. } | GdiCall::DeleteDc { .. } | GdiCall::DeleteObject { .. }
        )
    }
}

/// The stock object a fresh memory DC has selected.
const STOCK_BITMAP: Hgdiobj = Hgdiobj(0x0F);

/// Fake User32/GDI.  Configure with the `with_*` builders and the public
/// `fail_*` flags before wrapping it in a backend.
#[derive(Default)]
pub struct MockWin32 {
    windows: Vec<Hwnd>,
    titles: HashMap<Hwnd, Vec<u16>>,
    pids: HashMap<Hwnd, u32>,
    window_rects: HashMap<Hwnd, WinRect>,
    client_rects: HashMap<Hwnd, WinRect>,
    foreground: Option<Hwnd>,
    next_handle: Mutex<isize>,
    bitmap_sizes: Mutex<HashMap<Hbitmap, (i32, i32)>>,
    gdi: Mutex<Vec<GdiCall>>,
    messages: Mutex<Vec<(Hwnd, u32, usize, isize)>>,
    cursor: Mutex<Vec<(i32, i32)>>,
    pub fail_get_dc: bool,
    pub fail_bitmap: bool,
    pub fail_blit: bool,
    pub fail_bits: bool,
    pub fail_post: bool,
    pub fail_cursor: bool,
}

impl MockWin32 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level window to the enumeration order.
    pub fn with_window(mut self, hwnd: Hwnd) -> Self {
        self.windows.push(hwnd);
        self
    }

    pub fn with_title(mut self, hwnd: Hwnd, title: &str) -> Self {
        self.titles.insert(hwnd, title.encode_utf16().collect());
        self
    }

    pub fn with_pid(mut self, hwnd: Hwnd, pid: u32) -> Self {
        self.pids.insert(hwnd, pid);
        self
    }

    pub fn with_window_rect(mut self, hwnd: Hwnd, rect: WinRect) -> Self {
        self.window_rects.insert(hwnd, rect);
        self
    }

    pub fn with_client_rect(mut self, hwnd: Hwnd, rect: WinRect) -> Self {
        self.client_rects.insert(hwnd, rect);
        self
    }

    pub fn with_foreground(mut self, hwnd: Hwnd) -> Self {
        self.foreground = Some(hwnd);
        self
    }

    /// GDI calls recorded so far, oldest first.
    pub fn gdi_calls(&self) -> Vec<GdiCall> {
        self.gdi.lock().unwrap().clone()
    }

    /// Posted messages as `(hwnd, msg, wparam, lparam)`, oldest first.
    pub fn messages(&self) -> Vec<(Hwnd, u32, usize, isize)> {
        self.messages.lock().unwrap().clone()
    }

    /// `SetCursorPos` arguments, oldest first.
    pub fn cursor_moves(&self) -> Vec<(i32, i32)> {
        self.cursor.lock().unwrap().clone()
    }

    /// DCs and bitmaps created.
    pub fn allocations(&self) -> usize {
        self.gdi.lock().unwrap().iter().filter(|c| c.is_allocation()).count()
    }

    /// DCs and bitmaps released or deleted.
    pub fn releases(&self) -> usize {
        self.gdi.lock().unwrap().iter().filter(|c| c.is_release()).count()
    }

    pub fn outstanding(&self) -> usize {
        self.allocations() - self.releases()
    }

    fn handle(&self) -> isize {
        let mut next = self.next_handle.lock().unwrap();
        *next += 1;
        0x1000 + *next
    }

    fn record(&self, call: GdiCall) {
        self.gdi.lock().unwrap().push(call);
    }
}

impl Win32Api for MockWin32 {
    fn enum_windows(&self, visit: &mut dyn FnMut(Hwnd) -> bool) {
        for &hwnd in &self.windows {
            if !visit(hwnd) {
                break;
            }
        }
    }

    /// Copies at most `buf.len() - 1` units and NUL-terminates, like
    /// `GetWindowTextW`.
    fn window_text(&self, hwnd: Hwnd, buf: &mut [u16]) -> usize {
        let Some(title) = self.titles.get(&hwnd) else {
            return 0;
        };
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };
        let n = title.len().min(room);
        buf[..n].copy_from_slice(&title[..n]);
        buf[n] = 0;
        n
    }

    fn window_process_id(&self, hwnd: Hwnd) -> Option<u32> {
        self.pids.get(&hwnd).copied()
    }

    fn foreground_window(&self) -> Option<Hwnd> {
        self.foreground
    }

    fn window_rect(&self, hwnd: Hwnd) -> Option<WinRect> {
        self.window_rects.get(&hwnd).copied()
    }

    fn client_rect(&self, hwnd: Hwnd) -> Option<WinRect> {
        self.client_rects.get(&hwnd).copied()
    }

    fn get_dc(&self, hwnd: Hwnd) -> Option<Hdc> {
        if self.fail_get_dc {
            return None;
        }
        let hdc = Hdc(self.handle());
        self.record(GdiCall::GetDc { hwnd, hdc });
        Some(hdc)
    }

    fn release_dc(&self, hwnd: Hwnd, hdc: Hdc) {
        self.record(GdiCall::ReleaseDc { hwnd, hdc });
    }

    fn create_compatible_dc(&self, src: Hdc) -> Option<Hdc> {
        let hdc = Hdc(self.handle());
        self.record(GdiCall::CreateCompatibleDc { src, hdc });
        Some(hdc)
    }

    fn delete_dc(&self, hdc: Hdc) {
        self.record(GdiCall::DeleteDc { hdc });
    }

    fn create_compatible_bitmap(&self, hdc: Hdc, width: i32, height: i32) -> Option<Hbitmap> {
        if self.fail_bitmap || width <= 0 || height <= 0 {
            return None;
        }
        let bitmap = Hbitmap(self.handle());
        self.bitmap_sizes.lock().unwrap().insert(bitmap, (width, height));
        self.record(GdiCall::CreateCompatibleBitmap { hdc, width, height, bitmap });
        Some(bitmap)
    }

    fn delete_bitmap(&self, bitmap: Hbitmap) {
        self.record(GdiCall::DeleteObject { bitmap });
    }

    fn select_bitmap(&self, hdc: Hdc, bitmap: Hbitmap) -> Option<Hgdiobj> {
        self.record(GdiCall::SelectObject { hdc, bitmap });
        Some(STOCK_BITMAP)
    }

    fn restore_selection(&self, hdc: Hdc, previous: Hgdiobj) {
        self.record(GdiCall::RestoreSelection { hdc, previous });
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
        self.record(GdiCall::BitBlt { dest, width, height, src, src_x, src_y });
        !self.fail_blit
    }

    /// Fills the buffer with opaque mid-grey BGRA pixels.
    fn bitmap_bits(&self, bitmap: Hbitmap, buf: &mut [u8]) -> usize {
        let copied = if self.fail_bits {
            0
        } else {
            let (w, h) = self
                .bitmap_sizes
                .lock()
                .unwrap()
                .get(&bitmap)
                .copied()
                .unwrap_or((0, 0));
            let n = buf.len().min(w as usize * h as usize * 4);
            for px in buf[..n].chunks_exact_mut(4) {
                px.copy_from_slice(&[0x80, 0x80, 0x80, 0xFF]);
            }
            n
        };
        self.record(GdiCall::GetBitmapBits { bitmap, copied });
        copied
    }

    fn post_message(&self, hwnd: Hwnd, msg: u32, wparam: usize, lparam: isize) -> bool {
        if self.fail_post {
            return false;
        }
        self.messages.lock().unwrap().push((hwnd, msg, wparam, lparam));
        true
    }

    fn set_cursor_pos(&self, x: i32, y: i32) -> bool {
        if self.fail_cursor {
            return false;
        }
        self.cursor.lock().unwrap().push((x, y));
        true
    }
}
