//! Captured pixel buffers.
//!
//! An [`Image`] owns the bytes copied out of a native capture.  Pixels are
//! stored row-major, 4 bytes each, so pixel `(x, y)` occupies bytes
//! `(y * width + x) * 4 .. (y * width + x) * 4 + 4`.
//!
//! # Channel order
//!
//! The bytes are kept in the native layout the backend produced.  For the
//! 32-bit TrueColor visuals both backends target that layout is BGRA on
//! little-endian hosts (X11 ZPixmap with `0x00FF0000` red mask, GDI 32-bpp
//! device bitmaps).  The fourth byte is padding on both and usually reads as
//! 0 (X11) or 0/255 (GDI).  [`Image::channel_order`] records the layout and
//! [`Image::to_rgba`] produces a converted copy; nothing is converted
//! implicitly.

use std::fmt;

use crate::error::DsiError;

/// Byte order of the four bytes making up one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Bgra,
    Rgba,
}

/// An owned 32-bit pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Image {
    /// Wraps `data` as a `width` x `height` image.
    ///
    /// # Errors
    ///
    /// Returns [`DsiError::InvalidImage`] if `data.len() != width * height * 4`.
    /// A size that does not fit in `usize` is reported as `expected: usize::MAX`.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        order: ChannelOrder,
    ) -> Result<Self, DsiError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        if expected != Some(data.len()) {
            return Err(DsiError::InvalidImage {
                expected: expected.unwrap_or(usize::MAX),
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// Array shape in `(rows, columns, channels)` form.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, 4)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the four raw bytes of pixel `(x, y)`, or `None` when the
    /// coordinates fall outside the image.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[start..start + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterates over the image one row of bytes at a time.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on a zero chunk size.
        let stride = (self.width as usize * 4).max(1);
        self.data.chunks_exact(stride).take(self.height as usize)
    }

    /// Returns a copy of this image with channels in RGBA order.
    pub fn to_rgba(&self) -> Image {
        let mut data = self.data.clone();
        if self.order == ChannelOrder::Bgra {
            for px in data.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        Image {
            width: self.width,
            height: self.height,
            order: ChannelOrder::Rgba,
            data,
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image(width={}, height={})", self.width, self.height)
    }
}
