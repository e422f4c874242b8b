//! Interleaved multi-channel images.

use crate::geometry::BoundingBox;
use crate::image::OwnedImage;
use crate::util::{SlideError, SlideResult};

/// Channel order of an interleaved 8-bit image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Red, green, blue, alpha. Pieces carry transparency in this layout.
    Rgba8,
    /// Red, green, blue.
    Rgb8,
    /// Blue, green, red (the order most vision toolkits decode into).
    Bgr8,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgba8 => 4,
            PixelLayout::Rgb8 | PixelLayout::Bgr8 => 3,
        }
    }

    /// Offsets of the red, green and blue samples inside one pixel.
    fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelLayout::Rgba8 | PixelLayout::Rgb8 => (0, 1, 2),
            PixelLayout::Bgr8 => (2, 1, 0),
        }
    }
}

/// Owned interleaved image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    layout: PixelLayout,
}

impl ColorImage {
    /// Wraps `width * height * channels` interleaved bytes.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> SlideResult<Self> {
        if width == 0 || height == 0 {
            return Err(SlideError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(layout.channels()))
            .ok_or(SlideError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(SlideError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Creates an image where every pixel equals `pixel`.
    pub fn filled(
        width: usize,
        height: usize,
        layout: PixelLayout,
        pixel: &[u8],
    ) -> SlideResult<Self> {
        if pixel.len() != layout.channels() {
            return Err(SlideError::ChannelMismatch {
                expected: layout.channels(),
                got: pixel.len(),
            });
        }
        let data = pixel.repeat(width * height);
        Self::new(data, width, height, layout)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = (y * self.width + x) * c;
        self.data.get(start..start + c)
    }

    /// Overwrites pixel `(x, y)`; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: usize, y: usize, pixel: &[u8]) {
        let c = self.channels();
        if x >= self.width || y >= self.height || pixel.len() != c {
            return;
        }
        let start = (y * self.width + x) * c;
        self.data[start..start + c].copy_from_slice(pixel);
    }

    /// Writes an RGB color into pixel `(x, y)` honoring the channel order.
    /// Alpha, when present, is set to opaque.
    pub fn put_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let c = self.channels();
        let (r, g, b) = self.layout.rgb_offsets();
        let start = (y * self.width + x) * c;
        self.data[start + r] = rgb[0];
        self.data[start + g] = rgb[1];
        self.data[start + b] = rgb[2];
        if self.layout == PixelLayout::Rgba8 {
            self.data[start + 3] = 255;
        }
    }

    /// Converts to single-channel luma with BT.601 weights.
    ///
    /// Alpha is ignored, so fully transparent pixels keep whatever color
    /// they store.
    pub fn to_gray(&self) -> OwnedImage {
        let c = self.channels();
        let (r, g, b) = self.layout.rgb_offsets();
        let data: Vec<u8> = self
            .data
            .chunks_exact(c)
            .map(|px| {
                let luma = 0.299 * f32::from(px[r])
                    + 0.587 * f32::from(px[g])
                    + 0.114 * f32::from(px[b]);
                luma.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        OwnedImage::from_raw_parts(data, self.width, self.height)
    }

    /// Extracts the alpha plane of an RGBA image.
    pub fn alpha(&self) -> SlideResult<OwnedImage> {
        if self.layout != PixelLayout::Rgba8 {
            return Err(SlideError::ChannelMismatch {
                expected: 4,
                got: self.channels(),
            });
        }
        let data = self.data.chunks_exact(4).map(|px| px[3]).collect();
        Ok(OwnedImage::from_raw_parts(data, self.width, self.height))
    }

    /// Copies the pixels inside `bbox` into a new image.
    pub fn crop(&self, bbox: BoundingBox) -> SlideResult<ColorImage> {
        if bbox.right() > self.width || bbox.bottom() > self.height {
            return Err(SlideError::RoiOutOfBounds {
                x: bbox.x(),
                y: bbox.y(),
                width: bbox.width(),
                height: bbox.height(),
                img_width: self.width,
                img_height: self.height,
            });
        }
        let c = self.channels();
        let mut data = Vec::with_capacity(bbox.area() * c);
        for y in bbox.y()..bbox.bottom() {
            let start = (y * self.width + bbox.x()) * c;
            data.extend_from_slice(&self.data[start..start + bbox.width() * c]);
        }
        ColorImage::new(data, bbox.width(), bbox.height(), self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorImage, PixelLayout};
    use crate::geometry::BoundingBox;
    use crate::util::SlideError;

    #[test]
    fn gray_conversion_respects_channel_order() {
        let rgb = ColorImage::new(vec![255, 0, 0], 1, 1, PixelLayout::Rgb8).unwrap();
        let bgr = ColorImage::new(vec![0, 0, 255], 1, 1, PixelLayout::Bgr8).unwrap();
        assert_eq!(rgb.to_gray().data(), &[76]);
        assert_eq!(bgr.to_gray().data(), &[76]);
    }

    #[test]
    fn alpha_requires_rgba() {
        let bgr = ColorImage::filled(2, 2, PixelLayout::Bgr8, &[1, 2, 3]).unwrap();
        assert_eq!(
            bgr.alpha().unwrap_err(),
            SlideError::ChannelMismatch {
                expected: 4,
                got: 3
            }
        );
        let rgba = ColorImage::filled(2, 1, PixelLayout::Rgba8, &[1, 2, 3, 9]).unwrap();
        assert_eq!(rgba.alpha().unwrap().data(), &[9, 9]);
    }

    #[test]
    fn crop_copies_requested_window() {
        let mut img = ColorImage::filled(4, 3, PixelLayout::Rgb8, &[0, 0, 0]).unwrap();
        img.put_rgb(2, 1, [10, 20, 30]);
        let cropped = img.crop(BoundingBox::new(2, 1, 2, 2).unwrap()).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.pixel(0, 0).unwrap(), &[10, 20, 30]);
        assert_eq!(cropped.pixel(1, 1).unwrap(), &[0, 0, 0]);
    }
}
