//! Recording fake of the Xlib surface for tests.
//!
//! `MockXlib` serves a configurable window tree, property table and geometry
//! map, and records every output call (`XSendEvent`, `XWarpPointer`,
//! `XFlush`, `XGetImage`) in order.  It also keeps a ledger of every
//! client-side allocation it hands out and every release it receives, so
//! tests can assert that each property buffer, child list and image is freed
//! exactly once.
//!
//! # Usage
//!
//! ```ignore
//! let mock = MockXlib::new(0x100)
//!     .with_children(0x100, &[0x2a])
//!     .with_name(0x2a, "Terminal");
//! let backend = X11Backend::new(mock);
//!
//! let win = backend.all_windows().remove(0);
//! assert_eq!(win.name().as_deref(), Some("Terminal"));
//! assert_eq!(backend.api().outstanding(), 0);
//! ```

use std::collections::HashMap;
use std::os::raw::c_long;
use std::sync::Mutex;

use dsi_core::Rect;

use super::{Atom, ImageData, PropertyData, SyntheticEvent, XlibApi, Xid};

/// One recorded output call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XCall {
    SendEvent {
        window: Xid,
        propagate: bool,
        event_mask: i64,
        event: SyntheticEvent,
    },
    WarpPointer {
        dest: Xid,
        x: i32,
        y: i32,
    },
    Flush,
    GetImage {
        window: Xid,
        region: Rect,
        plane_mask: u64,
        format: i32,
    },
}

/// Kinds of client-side allocation tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Property,
    Children,
    Image,
}

#[derive(Debug, Clone)]
struct StoredProperty {
    format: i32,
    data: Vec<u8>,
}

/// A property buffer handed out by [`MockXlib`].
#[derive(Debug)]
pub struct MockProperty {
    id: u64,
    format: i32,
    data: Vec<u8>,
}

impl PropertyData for MockProperty {
    fn format(&self) -> i32 {
        self.format
    }
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// A child list handed out by [`MockXlib`].
#[derive(Debug)]
pub struct MockChildren {
    id: u64,
    xids: Vec<Xid>,
}

impl AsRef<[Xid]> for MockChildren {
    fn as_ref(&self) -> &[Xid] {
        &self.xids
    }
}

/// An image handed out by [`MockXlib`].
#[derive(Debug)]
pub struct MockImage {
    id: u64,
    width: u32,
    height: u32,
    bytes_per_line: usize,
    bits_per_pixel: u32,
    data: Vec<u8>,
}

impl ImageData for MockImage {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }
    fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    allocated: Vec<(ResourceKind, u64)>,
    freed: Vec<(ResourceKind, u64)>,
}

impl Ledger {
    fn allocate(&mut self, kind: ResourceKind) -> u64 {
        self.next_id += 1;
        self.allocated.push((kind, self.next_id));
        self.next_id
    }

    fn free(&mut self, kind: ResourceKind, id: u64) {
        assert!(
            self.allocated.contains(&(kind, id)),
            "freeing {kind:?} #{id} that was never allocated"
        );
        assert!(
            !self.freed.contains(&(kind, id)),
            "double free of {kind:?} #{id}"
        );
        self.freed.push((kind, id));
    }
}

/// Fake X connection.  Configure with the `with_*` builders before wrapping
/// it in a backend.
pub struct MockXlib {
    root: Xid,
    tree: HashMap<Xid, Vec<Xid>>,
    properties: HashMap<(Xid, String), StoredProperty>,
    geometries: HashMap<Xid, Rect>,
    keycodes: HashMap<u64, u8>,
    atoms: Mutex<Vec<String>>,
    calls: Mutex<Vec<XCall>>,
    ledger: Mutex<Ledger>,
    /// Bits per pixel reported by every image.
    pub bits_per_pixel: u32,
    /// Extra bytes appended to each image row.
    pub row_padding: usize,
    /// When `true`, `get_image` returns `None`.
    pub fail_get_image: bool,
}

impl MockXlib {
    pub fn new(root: Xid) -> Self {
        Self {
            root,
            tree: HashMap::new(),
            properties: HashMap::new(),
            geometries: HashMap::new(),
            keycodes: HashMap::new(),
            atoms: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            ledger: Mutex::new(Ledger::default()),
            bits_per_pixel: 32,
            row_padding: 0,
            fail_get_image: false,
        }
    }

    pub fn with_children(mut self, parent: Xid, children: &[Xid]) -> Self {
        self.tree.insert(parent, children.to_vec());
        self
    }

    pub fn with_raw_property(
        mut self,
        window: Xid,
        name: &str,
        format: i32,
        data: Vec<u8>,
    ) -> Self {
        self.properties
            .insert((window, name.to_string()), StoredProperty { format, data });
        self
    }

    pub fn with_name(self, window: Xid, name: &str) -> Self {
        self.with_raw_property(window, "_NET_WM_NAME", 8, name.as_bytes().to_vec())
    }

    pub fn with_pid(self, window: Xid, pid: u32) -> Self {
        self.with_raw_property(window, "_NET_WM_PID", 32, long_bytes(i64::from(pid)))
    }

    pub fn with_active(self, window: Xid) -> Self {
        let root = self.root;
        self.with_raw_property(root, "_NET_ACTIVE_WINDOW", 32, long_bytes(window as i64))
    }

    pub fn with_geometry(mut self, window: Xid, geometry: Rect) -> Self {
        self.geometries.insert(window, geometry);
        self
    }

    pub fn with_keycode(mut self, keysym: u64, keycode: u8) -> Self {
        self.keycodes.insert(keysym, keycode);
        self
    }

    /// The pixel value every mock window holds at drawable coordinates
    /// `(x, y)`.
    pub fn pixel_at(x: i32, y: i32) -> [u8; 4] {
        [x as u8, y as u8, 0x7F, 0xFF]
    }

    /// Output calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<XCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn allocations(&self, kind: ResourceKind) -> usize {
        let ledger = self.ledger.lock().unwrap();
        ledger.allocated.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn frees(&self, kind: ResourceKind) -> usize {
        let ledger = self.ledger.lock().unwrap();
        ledger.freed.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Allocations not yet released, across all kinds.
    pub fn outstanding(&self) -> usize {
        let ledger = self.ledger.lock().unwrap();
        ledger.allocated.len() - ledger.freed.len()
    }

    fn record(&self, call: XCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn atom_name(&self, atom: Atom) -> Option<String> {
        let atoms = self.atoms.lock().unwrap();
        atom.checked_sub(1)
            .and_then(|i| atoms.get(i as usize))
            .cloned()
    }
}

/// A C `long` in native layout, the way Xlib stores format-32 items.
fn long_bytes(value: i64) -> Vec<u8> {
    (value as c_long).to_ne_bytes().to_vec()
}

impl XlibApi for MockXlib {
    type Property = MockProperty;
    type Children = MockChildren;
    type Image = MockImage;

    fn root_window(&self) -> Xid {
        self.root
    }

    fn intern_atom(&self, name: &str) -> Atom {
        let mut atoms = self.atoms.lock().unwrap();
        match atoms.iter().position(|a| a == name) {
            Some(i) => i as Atom + 1,
            None => {
                atoms.push(name.to_string());
                atoms.len() as Atom
            }
        }
    }

    fn get_window_property(
        &self,
        window: Xid,
        property: Atom,
        _max_items: i64,
    ) -> Option<MockProperty> {
        let name = self.atom_name(property)?;
        let stored = self.properties.get(&(window, name))?.clone();
        let id = self.ledger.lock().unwrap().allocate(ResourceKind::Property);
        Some(MockProperty {
            id,
            format: stored.format,
            data: stored.data,
        })
    }

    fn free_property(&self, property: MockProperty) {
        self.ledger
            .lock()
            .unwrap()
            .free(ResourceKind::Property, property.id);
    }

    fn query_tree(&self, window: Xid) -> Option<MockChildren> {
        let xids = self.tree.get(&window).cloned().unwrap_or_default();
        let id = self.ledger.lock().unwrap().allocate(ResourceKind::Children);
        Some(MockChildren { id, xids })
    }

    fn free_children(&self, children: MockChildren) {
        self.ledger
            .lock()
            .unwrap()
            .free(ResourceKind::Children, children.id);
    }

    fn window_attributes(&self, window: Xid) -> Option<Rect> {
        self.geometries.get(&window).copied()
    }

    fn get_image(
        &self,
        window: Xid,
        region: Rect,
        plane_mask: u64,
        format: i32,
    ) -> Option<MockImage> {
        self.record(XCall::GetImage {
            window,
            region,
            plane_mask,
            format,
        });
        if self.fail_get_image || region.width <= 0 || region.height <= 0 {
            return None;
        }

        let (width, height) = (region.width as u32, region.height as u32);
        let pixel_bytes = (self.bits_per_pixel as usize).div_ceil(8);
        let bytes_per_line = width as usize * pixel_bytes + self.row_padding;
        let mut data = vec![0u8; bytes_per_line * height as usize];
        if self.bits_per_pixel == 32 {
            for y in 0..height {
                for x in 0..width {
                    let start = y as usize * bytes_per_line + x as usize * 4;
                    let pixel = Self::pixel_at(region.x + x as i32, region.y + y as i32);
                    data[start..start + 4].copy_from_slice(&pixel);
                }
            }
        }

        let id = self.ledger.lock().unwrap().allocate(ResourceKind::Image);
        Some(MockImage {
            id,
            width,
            height,
            bytes_per_line,
            bits_per_pixel: self.bits_per_pixel,
            data,
        })
    }

    fn destroy_image(&self, image: MockImage) {
        self.ledger.lock().unwrap().free(ResourceKind::Image, image.id);
    }

    fn keysym_to_keycode(&self, keysym: u64) -> u8 {
        self.keycodes.get(&keysym).copied().unwrap_or(0)
    }

    fn send_event(
        &self,
        window: Xid,
        propagate: bool,
        event_mask: i64,
        event: &SyntheticEvent,
    ) -> bool {
        self.record(XCall::SendEvent {
            window,
            propagate,
            event_mask,
            event: *event,
        });
        true
    }

    fn warp_pointer(&self, dest: Xid, x: i32, y: i32) {
        self.record(XCall::WarpPointer { dest, x, y });
    }

    fn flush(&self) {
        self.record(XCall::Flush);
    }
}
