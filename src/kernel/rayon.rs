//! Rayon-parallel dense scan (feature-gated).
//!
//! Rows of placements are scored in parallel and merged into one Top-K
//! collector. Peak ordering is total, so the result is identical to the
//! sequential scan.

use crate::candidate::topk::{Peak, TopK};
use crate::image::ImageView;
use crate::kernel::scalar::{max_placement, scan_row};
use crate::kernel::{Kernel, ScanParams};
use crate::util::SlideResult;
use rayon::prelude::*;

/// Row-parallel counterpart of [`crate::kernel::scalar::scan_full`].
pub fn scan_full_par<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    params: &ScanParams,
) -> SlideResult<Vec<Peak>> {
    let (max_x, max_y) = max_placement(image, K::template_size(plan))?;
    if params.topk == 0 {
        return Ok(Vec::new());
    }

    let merged = (0..=max_y)
        .into_par_iter()
        .map(|y| scan_row::<K>(image, plan, y, 0, max_x, params))
        .reduce(
            || TopK::new(params.topk, K::METRIC),
            |mut acc, row| {
                acc.extend(row);
                acc
            },
        );

    Ok(merged.into_sorted())
}
