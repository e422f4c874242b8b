//! Global Otsu thresholding.

use crate::image::{ImageView, OwnedImage, MASK_ON};

fn histogram(gray: ImageView<'_, u8>) -> ([u64; 256], u64) {
    let mut hist = [0u64; 256];
    let mut total = 0u64;
    for y in 0..gray.height() {
        if let Some(row) = gray.row(y) {
            for &v in row {
                hist[v as usize] += 1;
            }
            total += row.len() as u64;
        }
    }
    (hist, total)
}

/// Computes the Otsu threshold of a grayscale image.
///
/// Returns the level `t` that maximizes the between-class variance of the
/// split `{<= t}` / `{> t}`, which is the same level that minimizes the
/// weighted intra-class variance. Ties keep the lowest level, and a uniform
/// image returns its single value.
pub fn otsu_threshold(gray: ImageView<'_, u8>) -> u8 {
    let (hist, total) = histogram(gray);
    let total = total as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = hist.iter().position(|&h| h > 0).unwrap_or(0) as u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Inverse binary threshold: pixels `<= t` become [`MASK_ON`], the rest 0.
pub fn threshold_binary_inv(gray: ImageView<'_, u8>, t: u8) -> OwnedImage {
    let mut out = Vec::with_capacity(gray.width() * gray.height());
    for y in 0..gray.height() {
        if let Some(row) = gray.row(y) {
            out.extend(row.iter().map(|&v| if v > t { 0 } else { MASK_ON }));
        }
    }
    OwnedImage::from_raw_parts(out, gray.width(), gray.height())
}
