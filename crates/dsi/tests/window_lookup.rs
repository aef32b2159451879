//! Integration tests for the `Dsi` facade over both backends.
//!
//! The same desktop (three windows, one of them focused) is served by each
//! recording fake, and the facade's lookups must agree on the answers.

use dsi::infrastructure::win32::mock::MockWin32;
use dsi::infrastructure::win32::{Hwnd, WinRect, Win32Backend};
use dsi::infrastructure::x11::mock::MockXlib;
use dsi::infrastructure::x11::X11Backend;
use dsi::{Backend, Dsi};
use dsi_core::{Rect, Window};

const ROOT: u64 = 0x100;

/// `(handle, name, pid)` for each top-level window, in stacking order.
const DESKTOP: [(u64, Option<&str>, Option<u32>); 3] = [
    (0x2a, Some("Terminal - bash"), Some(300)),
    (0x2b, None, Some(301)),
    (0x2c, Some("Notes - terminal"), Some(300)),
];
const FOCUSED: u64 = 0x2c;

fn x11_desktop() -> Dsi<X11Backend<MockXlib>> {
    let handles: Vec<u64> = DESKTOP.iter().map(|w| w.0).collect();
    let mut mock = MockXlib::new(ROOT)
        .with_children(ROOT, &handles)
        .with_active(FOCUSED)
        .with_geometry(0x2a, Rect::new(0, 0, 640, 480));
    for (xid, name, pid) in DESKTOP {
        if let Some(name) = name {
            mock = mock.with_name(xid, name);
        }
        if let Some(pid) = pid {
            mock = mock.with_pid(xid, pid);
        }
    }
    Dsi::with_backend(X11Backend::new(mock))
}

fn win32_desktop() -> Dsi<Win32Backend<MockWin32>> {
    let mut mock = MockWin32::new()
        .with_foreground(Hwnd(FOCUSED as isize))
        .with_window_rect(Hwnd(0x2a), WinRect::new(0, 0, 640, 480))
        .with_client_rect(Hwnd(0x2a), WinRect::new(0, 0, 640, 480));
    for (h, name, pid) in DESKTOP {
        let hwnd = Hwnd(h as isize);
        mock = mock.with_window(hwnd);
        if let Some(name) = name {
            mock = mock.with_title(hwnd, name);
        }
        if let Some(pid) = pid {
            mock = mock.with_pid(hwnd, pid);
        }
    }
    Dsi::with_backend(Win32Backend::new(mock))
}

/// Runs the shared lookup assertions against one facade.
fn check_lookups<B: Backend>(dsi: &Dsi<B>) {
    let handles: Vec<u64> = dsi.get_all_windows().iter().map(|w| w.handle()).collect();
    assert_eq!(handles, vec![0x2a, 0x2b, 0x2c]);

    let active = dsi.get_active_window().expect("a focused window");
    assert_eq!(active.handle(), FOCUSED);
    assert!(active.active());

    assert_eq!(dsi.get_window_by_pid(300).map(|w| w.handle()), Some(0x2a));
    assert_eq!(dsi.get_window_by_pid(301).map(|w| w.handle()), Some(0x2b));
    assert!(dsi.get_window_by_pid(302).is_none());

    assert_eq!(dsi.get_window_by_name("Terminal").map(|w| w.handle()), Some(0x2a));
    assert_eq!(dsi.get_window_by_name("terminal").map(|w| w.handle()), Some(0x2c));
    assert!(dsi.get_window_by_name("TERMINAL").is_none());
}

#[test]
fn test_x11_facade_lookups() {
    let dsi = x11_desktop();

    check_lookups(&dsi);

    assert_eq!(dsi.backend().api().outstanding(), 0);
}

#[test]
fn test_win32_facade_lookups() {
    check_lookups(&win32_desktop());
}

#[test]
fn test_unnamed_window_reports_no_name_on_both_backends() {
    let x = x11_desktop().get_window_by_pid(301).expect("x11 window");
    let w = win32_desktop().get_window_by_pid(301).expect("win32 window");

    assert_eq!(x.name(), None);
    assert_eq!(w.name(), None);
}

#[test]
fn test_snapshot_reads_every_attribute() {
    let window = x11_desktop().get_window_by_name("bash").expect("terminal");

    let snap = window.snapshot();

    assert_eq!(snap.handle, 0x2a);
    assert_eq!(snap.name.as_deref(), Some("Terminal - bash"));
    assert_eq!(snap.pid, Some(300));
    assert!(!snap.active);
    assert_eq!(snap.geometry, Some(Rect::new(0, 0, 640, 480)));
}

#[test]
fn test_window_handles_outlive_repeated_enumeration() {
    let dsi = win32_desktop();
    let first = dsi.get_all_windows();

    let second = dsi.get_all_windows();

    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].name(), second[0].name());
}
