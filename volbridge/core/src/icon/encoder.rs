//! Icon Bitmap Encoding
//!
//! Converts an arbitrary raw image into the device's fixed icon format:
//!
//! ```text
//! 32 x 32 pixels, row-major, top-left origin
//! each pixel RGB565, little-endian:
//!
//!   bit 15      11 10         5 4        0
//!      [ r7..r3  ][  g7..g2    ][ b7..b3  ]
//! ```
//!
//! Alpha is dropped (no transparency on the wire). Resampling is a box
//! filter: each target pixel averages the source rectangle it covers, which
//! degrades to nearest-neighbour when enlarging. Integer arithmetic only, so
//! the output is identical on every platform.

use super::IconError;

/// Icon edge length in pixels
pub const ICON_SIZE: usize = 32;

/// Encoded icon size in bytes (32 * 32 pixels * 2 bytes)
pub const ICON_BYTES: usize = ICON_SIZE * ICON_SIZE * 2;

/// Channel layout of a [`RawImage`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 1 byte per pixel
    Gray,
    /// 2 bytes per pixel, gray + alpha
    GrayAlpha,
    /// 3 bytes per pixel
    Rgb,
    /// 4 bytes per pixel
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Red, green and blue of the pixel starting at `px`
    fn rgb(self, px: &[u8]) -> [u8; 3] {
        match self {
            Self::Gray | Self::GrayAlpha => [px[0], px[0], px[0]],
            Self::Rgb | Self::Rgba => [px[0], px[1], px[2]],
        }
    }
}

/// Decoded source image, 8 bits per channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RawImage {
    /// Wrap a pixel buffer, checking that its size matches the dimensions
    ///
    /// # Errors
    ///
    /// Returns `IconError::Decode` for zero dimensions or a buffer of the
    /// wrong length.
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, IconError> {
        if width == 0 || height == 0 {
            return Err(IconError::Decode(format!(
                "image has zero size ({width}x{height})"
            )));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| IconError::Decode(format!("image too large ({width}x{height})")))?;
        if data.len() != expected {
            return Err(IconError::Decode(format!(
                "expected {expected} bytes for {width}x{height} {format:?}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Channel layout
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let bpp = self.format.bytes_per_pixel();
        let start = (y * self.width + x) * bpp;
        self.format.rgb(&self.data[start..start + bpp])
    }
}

/// Exactly [`ICON_BYTES`] bytes of RGB565 pixel data
#[derive(Clone, PartialEq, Eq)]
pub struct IconBitmap(Box<[u8; ICON_BYTES]>);

impl std::fmt::Debug for IconBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IconBitmap({} bytes)", ICON_BYTES)
    }
}

impl IconBitmap {
    /// Wire bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Packed pixel at `(x, y)`
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        let i = (y * ICON_SIZE + x) * 2;
        u16::from_le_bytes([self.0[i], self.0[i + 1]])
    }
}

/// Pack 8-bit RGB into RGB565
#[must_use]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

/// Source span covered by target index `t` along an axis of `src` pixels
fn span(t: usize, src: usize) -> (usize, usize) {
    let start = t * src / ICON_SIZE;
    let end = ((t + 1) * src / ICON_SIZE).max(start + 1);
    (start, end.min(src))
}

/// Encode an image into the device's icon format
///
/// The image has already been validated by [`RawImage::new`], so encoding
/// itself cannot fail and always yields [`ICON_BYTES`] bytes.
#[must_use]
pub fn encode_icon(image: &RawImage) -> IconBitmap {
    let mut out = Box::new([0u8; ICON_BYTES]);

    for ty in 0..ICON_SIZE {
        let (y0, y1) = span(ty, image.height);
        for tx in 0..ICON_SIZE {
            let (x0, x1) = span(tx, image.width);

            let mut sum = [0u64; 3];
            for y in y0..y1 {
                for x in x0..x1 {
                    let [r, g, b] = image.rgb_at(x, y);
                    sum[0] += u64::from(r);
                    sum[1] += u64::from(g);
                    sum[2] += u64::from(b);
                }
            }
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            let avg = |c: u64| ((c + count / 2) / count) as u8;

            let packed = pack_rgb565(avg(sum[0]), avg(sum[1]), avg(sum[2]));
            let i = (ty * ICON_SIZE + tx) * 2;
            out[i..i + 2].copy_from_slice(&packed.to_le_bytes());
        }
    }

    IconBitmap(out)
}
