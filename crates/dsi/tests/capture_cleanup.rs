//! Integration tests for native resource cleanup during window capture.
//!
//! Both backends run against their recording fakes.  Each test captures a
//! window, sometimes with a native call forced to fail, and then checks the
//! fake's ledger: every DC, bitmap and image handed out must have been
//! released exactly once, whatever the outcome.

use dsi::infrastructure::win32::mock::{GdiCall, MockWin32};
use dsi::infrastructure::win32::{Hwnd, WinRect, Win32Backend};
use dsi::infrastructure::x11::mock::{MockXlib, ResourceKind, XCall};
use dsi::infrastructure::x11::X11Backend;
use dsi_core::{DsiError, Rect, Window};

const ROOT: u64 = 0x100;
const XWIN: u64 = 0x2a;
const HWND: Hwnd = Hwnd(0x42);

fn x11(configure: impl FnOnce(&mut MockXlib)) -> X11Backend<MockXlib> {
    let mut mock = MockXlib::new(ROOT)
        .with_children(ROOT, &[XWIN])
        .with_geometry(XWIN, Rect::new(40, 30, 16, 8));
    configure(&mut mock);
    X11Backend::new(mock)
}

fn win32(configure: impl FnOnce(&mut MockWin32)) -> Win32Backend<MockWin32> {
    let mut mock = MockWin32::new()
        .with_window(HWND)
        .with_window_rect(HWND, WinRect::new(100, 50, 916, 688))
        .with_client_rect(HWND, WinRect::new(0, 0, 800, 600));
    configure(&mut mock);
    Win32Backend::new(mock)
}

// ── X11 ───────────────────────────────────────────────────────────────────────

#[test]
fn test_x11_repeated_captures_free_every_image() {
    // Arrange
    let backend = x11(|_| {});
    let window = backend.window(XWIN);

    // Act
    for _ in 0..5 {
        let image = window.capture(None).expect("capture");
        assert_eq!((image.width(), image.height()), (16, 8));
    }

    // Assert
    let api = backend.api();
    assert_eq!(api.allocations(ResourceKind::Image), 5);
    assert_eq!(api.frees(ResourceKind::Image), 5);
    assert_eq!(api.outstanding(), 0);
}

#[test]
fn test_x11_region_capture_reads_region_pixels() {
    // Arrange
    let backend = x11(|_| {});
    let region = Rect::new(2, 1, 3, 2);

    // Act
    let image = backend.window(XWIN).capture(Some(region)).expect("capture");

    // Assert: the region reaches XGetImage unchanged, and image pixel (2, 1)
    // is drawable pixel (4, 2).
    assert!(backend.api().calls().iter().any(|c| matches!(
        c,
        XCall::GetImage { window: XWIN, region: r, .. } if *r == region
    )));
    assert_eq!((image.width(), image.height()), (3, 2));
    assert_eq!(image.get_pixel(0, 0), Some(MockXlib::pixel_at(2, 1)));
    assert_eq!(image.get_pixel(2, 1), Some(MockXlib::pixel_at(4, 2)));
    assert_eq!(backend.api().outstanding(), 0);
}

#[test]
fn test_x11_unsupported_depth_still_destroys_image() {
    // Arrange
    let backend = x11(|m| m.bits_per_pixel = 24);

    // Act
    let err = backend.window(XWIN).capture(None).expect_err("24 bpp");

    // Assert
    assert_eq!(err, DsiError::UnsupportedPixelFormat { bits_per_pixel: 24 });
    assert_eq!(backend.api().allocations(ResourceKind::Image), 1);
    assert_eq!(backend.api().frees(ResourceKind::Image), 1);
}

#[test]
fn test_x11_padded_rows_are_repacked() {
    let backend = x11(|m| m.row_padding = 12);

    let image = backend.window(XWIN).capture(None).expect("capture");

    assert_eq!(image.as_bytes().len(), 16 * 8 * 4);
    assert_eq!(image.get_pixel(15, 7), Some(MockXlib::pixel_at(15, 7)));
    assert_eq!(backend.api().outstanding(), 0);
}

#[test]
fn test_x11_failed_get_image_allocates_nothing() {
    let backend = x11(|m| m.fail_get_image = true);

    let err = backend.window(XWIN).capture(None).expect_err("XGetImage fails");

    assert!(matches!(err, DsiError::CaptureFailed(_)));
    assert_eq!(backend.api().allocations(ResourceKind::Image), 0);
    assert_eq!(backend.api().outstanding(), 0);
}

#[test]
fn test_x11_enumeration_and_queries_free_every_buffer() {
    // Arrange
    let mock = MockXlib::new(ROOT)
        .with_children(ROOT, &[0x2a, 0x2b])
        .with_children(0x2a, &[0x3a])
        .with_name(0x2a, "Terminal")
        .with_pid(0x2b, 77)
        .with_active(0x2b);
    let backend = X11Backend::new(mock);

    // Act
    for window in dsi::Backend::all_windows(&backend) {
        let _ = window.snapshot();
    }

    // Assert
    let api = backend.api();
    assert!(api.allocations(ResourceKind::Children) >= 4);
    assert_eq!(
        api.allocations(ResourceKind::Property),
        api.frees(ResourceKind::Property)
    );
    assert_eq!(api.outstanding(), 0);
}

// ── Win32 ─────────────────────────────────────────────────────────────────────

#[test]
fn test_win32_repeated_captures_release_every_handle() {
    // Arrange
    let backend = win32(|_| {});
    let window = backend.window(HWND);

    // Act
    for _ in 0..4 {
        let image = window.capture(None).expect("capture");
        assert_eq!((image.width(), image.height()), (800, 600));
    }

    // Assert: one window DC, one memory DC and one bitmap per capture.
    let api = backend.api();
    assert_eq!(api.allocations(), 12);
    assert_eq!(api.releases(), 12);
    assert_eq!(api.outstanding(), 0);
}

#[test]
fn test_win32_handles_are_released_in_reverse_order() {
    let backend = win32(|_| {});

    backend.window(HWND).capture(None).expect("capture");

    let names: Vec<&str> = backend.api().gdi_calls().iter().map(GdiCall::name).collect();
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
fn test_win32_region_blits_from_offset_within_window() {
    // Arrange: the client area starts at (100, 88) on screen.
    let backend = win32(|_| {});

    // Act
    let image = backend
        .window(HWND)
        .capture(Some(Rect::new(110, 98, 20, 10)))
        .expect("capture");

    // Assert
    assert_eq!((image.width(), image.height()), (20, 10));
    let blit = backend
        .api()
        .gdi_calls()
        .into_iter()
        .find(|c| matches!(c, GdiCall::BitBlt { .. }))
        .expect("BitBlt recorded");
    assert!(matches!(
        blit,
        GdiCall::BitBlt { width: 20, height: 10, src_x: 10, src_y: 10, .. }
    ));
}

#[test]
fn test_win32_failed_blit_releases_every_handle() {
    let backend = win32(|m| m.fail_blit = true);

    let err = backend.window(HWND).capture(None).expect_err("BitBlt fails");

    assert!(matches!(err, DsiError::CaptureFailed(_)));
    assert_eq!(backend.api().allocations(), 3);
    assert_eq!(backend.api().outstanding(), 0);
}

#[test]
fn test_win32_short_bitmap_copy_releases_every_handle() {
    let backend = win32(|m| m.fail_bits = true);

    let err = backend.window(HWND).capture(None).expect_err("GetBitmapBits fails");

    assert!(matches!(err, DsiError::CaptureFailed(_)));
    assert_eq!(backend.api().outstanding(), 0);
}

#[test]
fn test_win32_failed_bitmap_releases_both_dcs() {
    let backend = win32(|m| m.fail_bitmap = true);

    assert!(backend.window(HWND).capture(None).is_err());

    assert_eq!(backend.api().allocations(), 2);
    assert_eq!(backend.api().releases(), 2);
}

#[test]
fn test_win32_failed_get_dc_allocates_nothing() {
    let backend = win32(|m| m.fail_get_dc = true);

    assert!(backend.window(HWND).capture(None).is_err());

    assert!(backend.api().gdi_calls().is_empty());
}

#[test]
fn test_win32_vanished_window_is_unavailable() {
    let backend = win32(|_| {});

    let err = backend.window(Hwnd(0x99)).capture(None).expect_err("no geometry");

    assert_eq!(err, DsiError::WindowUnavailable(0x99));
    assert!(backend.api().gdi_calls().is_empty());
}
