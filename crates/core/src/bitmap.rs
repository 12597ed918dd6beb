//! RGB bitmaps as handed to print devices.

use image::{imageops, DynamicImage, RgbImage};

/// An RGB bitmap ready to be drawn on a page.
///
/// Construction always goes through [`Bitmap::from_rgb`] or
/// [`Bitmap::from_dynamic`], which apply the orientation policy: a bitmap
/// wider than it is tall is rotated 90° counter-clockwise so it better
/// matches portrait paper.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: RgbImage,
    rotated: bool,
}

impl Bitmap {
    /// Wrap an RGB image, rotating it if it is landscape.
    pub fn from_rgb(image: RgbImage) -> Self {
        if image.width() > image.height() {
            Self {
                image: imageops::rotate270(&image),
                rotated: true,
            }
        } else {
            Self {
                image,
                rotated: false,
            }
        }
    }

    /// Coerce any decoded image to RGB, then apply the orientation policy.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgb = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
        Self::from_rgb(rgb)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the orientation policy rotated the source.
    pub fn was_rotated(&self) -> bool {
        self.rotated
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    /// Pixel rows in device-independent bitmap layout: BGR byte order,
    /// each row padded to a multiple of four bytes, top row first.
    ///
    /// Pair with a negative height in the bitmap header.
    pub fn dib_rows(&self) -> Vec<u8> {
        let stride = dib_stride(self.width());
        let mut out = vec![0u8; stride * self.height() as usize];
        for (y, row) in self.image.rows().enumerate() {
            let line = &mut out[y * stride..];
            for (x, pixel) in row.enumerate() {
                let [r, g, b] = pixel.0;
                line[x * 3] = b;
                line[x * 3 + 1] = g;
                line[x * 3 + 2] = r;
            }
        }
        out
    }
}

/// Bytes per DIB row for a 24-bit bitmap of the given width.
pub fn dib_stride(width: u32) -> usize {
    ((width as usize * 3) + 3) & !3
}
