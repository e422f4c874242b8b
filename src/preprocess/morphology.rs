//! 3x3 binary morphology on masks.
//!
//! The square structuring element is clipped at the image border, so
//! pixels outside the image never influence the result.

use crate::image::{OwnedImage, MASK_ON};

fn apply_3x3(mask: &OwnedImage, keep_on: impl Fn(&[u8], usize, usize, usize) -> bool) -> OwnedImage {
    let width = mask.width();
    let height = mask.height();
    let src = mask.data();
    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            if keep_on(src, width, x, y) {
                out[y * width + x] = MASK_ON;
            }
        }
    }
    OwnedImage::from_raw_parts(out, width, height)
}

fn neighborhood(width: usize, height: usize, x: usize, y: usize) -> impl Iterator<Item = usize> {
    let ys = y.saturating_sub(1)..=(y + 1).min(height - 1);
    ys.flat_map(move |ky| {
        let xs = x.saturating_sub(1)..=(x + 1).min(width - 1);
        xs.map(move |kx| ky * width + kx)
    })
}

/// Erosion: a pixel stays on only if its whole 3x3 neighborhood is on.
pub fn erode_3x3(mask: &OwnedImage) -> OwnedImage {
    let height = mask.height();
    apply_3x3(mask, |src, width, x, y| {
        neighborhood(width, height, x, y).all(|idx| src[idx] != 0)
    })
}

/// Dilation: a pixel turns on if any pixel of its 3x3 neighborhood is on.
pub fn dilate_3x3(mask: &OwnedImage) -> OwnedImage {
    let height = mask.height();
    apply_3x3(mask, |src, width, x, y| {
        neighborhood(width, height, x, y).any(|idx| src[idx] != 0)
    })
}

/// Morphological opening: one erosion followed by one dilation.
pub fn open_3x3(mask: &OwnedImage) -> OwnedImage {
    dilate_3x3(&erode_3x3(mask))
}
