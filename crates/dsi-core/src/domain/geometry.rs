//! Window rectangles.

use std::fmt;

/// A rectangle with a position and a size, in pixels.
///
/// Values are stored exactly as constructed.  Neither backend guarantees a
/// non-negative width or height for a window in an unusual state, so callers
/// must not assume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Offset of this rectangle's origin relative to `origin`'s.
    ///
    /// Used to turn a capture region expressed in screen coordinates into a
    /// source offset inside a window's own surface.
    pub fn offset_from(&self, origin: &Rect) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }

    /// Number of bytes a 32-bit capture of this rectangle occupies.
    ///
    /// Negative dimensions count as zero.
    pub fn pixel_bytes(&self) -> usize {
        let width = usize::try_from(self.width).unwrap_or(0);
        let height = usize::try_from(self.height).unwrap_or(0);
        width * height * 4
    }
}

impl From<(i32, i32, i32, i32)> for Rect {
    fn from((x, y, width, height): (i32, i32, i32, i32)) -> Self {
        Self::new(x, y, width, height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect(x={}, y={}, width={}, height={})",
            self.x, self.y, self.width, self.height
        )
    }
}
