//! Image buffers used by the preprocessing and matching stages.
//!
//! `ImageView` is a borrowed single-channel 2D view into a 1D buffer with an
//! explicit stride (elements between the starts of consecutive rows). ROI
//! slices are zero-copy and keep the parent stride. `OwnedImage` is the
//! contiguous single-channel buffer behind grayscale images and binary
//! masks; `ColorImage` holds interleaved multi-channel pixels.

use crate::geometry::BoundingBox;
use crate::util::{SlideError, SlideResult};

mod color;
#[cfg(feature = "image-io")]
pub mod io;

pub use color::{ColorImage, PixelLayout};

/// Value of a set pixel in a binary mask.
pub const MASK_ON: u8 = 255;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> SlideResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> SlideResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(SlideError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    /// Returns row `y` trimmed to `width` elements.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Returns a zero-copy view of `bbox` inside this image.
    pub fn roi(&self, bbox: BoundingBox) -> SlideResult<ImageView<'a, T>> {
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
        let start = bbox.y() * self.stride + bbox.x();
        ImageView::new(&self.data[start..], bbox.width(), bbox.height(), self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> SlideResult<usize> {
    if width == 0 || height == 0 {
        return Err(SlideError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(SlideError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(SlideError::InvalidDimensions { width, height })
}

/// Owned contiguous single-channel `u8` image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> SlideResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() < needed {
            return Err(SlideError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(SlideError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Wraps a buffer whose length the caller already matched to the
    /// dimensions of an existing image.
    pub(crate) fn from_raw_parts(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Creates an image with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> SlideResult<Self> {
        let len = required_len(width, height, width)?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> Self {
        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            if let Some(row) = view.row(y) {
                data.extend_from_slice(row);
            }
        }
        Self {
            data,
            width: view.width(),
            height: view.height(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Sets pixel `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Returns true when every pixel is either 0 or [`MASK_ON`].
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v == 0 || v == MASK_ON)
    }

    /// Borrowed view of the whole image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}
