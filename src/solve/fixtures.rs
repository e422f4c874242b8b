//! Synthetic challenges shared by the solver tests.

use crate::image::{ColorImage, PixelLayout};

/// Jigsaw-like shape: a 20x20 body with a tab on the right.
pub(crate) fn in_shape(x: usize, y: usize) -> bool {
    (x < 20 && y < 20) || ((20..26).contains(&x) && (7..13).contains(&y))
}

/// A 160x80 textured background with a dark gap at (`gap_x`, `gap_y`) and
/// a 30-wide RGBA piece whose opaque shape starts at column 2.
pub(crate) fn challenge(gap_x: usize, gap_y: usize) -> (ColorImage, ColorImage) {
    let (w, h) = (160, 80);
    let mut bg = ColorImage::filled(w, h, PixelLayout::Bgr8, &[0, 0, 0]).unwrap();
    for y in 0..h {
        for x in 0..w {
            let v = 150 + ((x * 7 + y * 13) % 90) as u8;
            bg.put_rgb(x, y, [v, v, v]);
        }
    }
    let mut piece = ColorImage::filled(30, h, PixelLayout::Rgba8, &[0, 0, 0, 0]).unwrap();
    for y in 0..20 {
        for x in 0..26 {
            if in_shape(x, y) {
                bg.put_rgb(gap_x + x, gap_y + y, [40, 40, 40]);
                piece.put_pixel(2 + x, gap_y + y, &[220, 220, 220, 255]);
            }
        }
    }
    (bg, piece)
}
