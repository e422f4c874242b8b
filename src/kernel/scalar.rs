//! Scalar reference kernels and the sequential dense scan.

use crate::candidate::topk::{Peak, TopK};
use crate::image::ImageView;
use crate::kernel::{Kernel, ScanParams};
use crate::locate::Metric;
use crate::template::{SqDiffPlan, ZnccPlan};
use crate::util::{SlideError, SlideResult};

/// Zero-mean normalized cross-correlation; higher is better.
pub struct ZnccScalar;

/// Normalized squared difference; lower is better.
pub struct SqDiffScalar;

fn placement_fits(image: ImageView<'_, u8>, tpl: (usize, usize), x: usize, y: usize) -> bool {
    image.width() >= tpl.0
        && image.height() >= tpl.1
        && x <= image.width() - tpl.0
        && y <= image.height() - tpl.1
}

impl Kernel for ZnccScalar {
    type Plan = ZnccPlan;
    const METRIC: Metric = Metric::Zncc;

    fn plan(tpl: ImageView<'_, u8>) -> SlideResult<Self::Plan> {
        ZnccPlan::from_view(tpl)
    }

    fn template_size(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        params: &ScanParams,
    ) -> Option<f32> {
        let (tpl_width, tpl_height) = Self::template_size(plan);
        if !placement_fits(image, (tpl_width, tpl_height), x, y) {
            return None;
        }
        let t_prime = plan.t_prime();

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..tpl_height {
            let img_row = &image.row(y + ty)?[x..x + tpl_width];
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
            for (&t, &value) in tpl_row.iter().zip(img_row) {
                let value = f64::from(value);
                dot += f64::from(t) * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let n = (tpl_width * tpl_height) as f64;
        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= params.min_var_i {
            return None;
        }
        let score = (dot / (f64::from(plan.var_t()) * var_i).sqrt()) as f32;
        score.is_finite().then_some(score)
    }
}

impl Kernel for SqDiffScalar {
    type Plan = SqDiffPlan;
    const METRIC: Metric = Metric::SqDiffNormed;

    fn plan(tpl: ImageView<'_, u8>) -> SlideResult<Self::Plan> {
        SqDiffPlan::from_view(tpl)
    }

    fn template_size(plan: &Self::Plan) -> (usize, usize) {
        (plan.width(), plan.height())
    }

    fn score_at(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        _params: &ScanParams,
    ) -> Option<f32> {
        let (tpl_width, tpl_height) = Self::template_size(plan);
        if !placement_fits(image, (tpl_width, tpl_height), x, y) {
            return None;
        }
        let data = plan.data();

        let mut sse = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..tpl_height {
            let img_row = &image.row(y + ty)?[x..x + tpl_width];
            let tpl_row = &data[ty * tpl_width..(ty + 1) * tpl_width];
            for (&t, &value) in tpl_row.iter().zip(img_row) {
                let value = f64::from(value);
                let diff = f64::from(t) - value;
                sse += diff * diff;
                sum_i2 += value * value;
            }
        }

        let denom = (f64::from(plan.sum_sq()) * sum_i2).sqrt();
        if denom <= 0.0 {
            return None;
        }
        let score = (sse / denom) as f32;
        score.is_finite().then_some(score)
    }
}

/// Largest valid top-left placement, or `NoValidMatchWindow`.
pub(crate) fn max_placement(
    image: ImageView<'_, u8>,
    tpl: (usize, usize),
) -> SlideResult<(usize, usize)> {
    if image.width() < tpl.0 || image.height() < tpl.1 {
        return Err(SlideError::NoValidMatchWindow {
            tpl_width: tpl.0,
            tpl_height: tpl.1,
            img_width: image.width(),
            img_height: image.height(),
        });
    }
    Ok((image.width() - tpl.0, image.height() - tpl.1))
}

/// Scores one row of placements into a Top-K collector.
pub(crate) fn scan_row<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    y: usize,
    x0: usize,
    x1: usize,
    params: &ScanParams,
) -> TopK {
    let mut topk = TopK::new(params.topk, K::METRIC);
    for x in x0..=x1 {
        if let Some(score) = K::score_at(image, plan, x, y, params) {
            topk.push(Peak { x, y, score });
        }
    }
    topk
}

/// Scans every valid placement and returns the best peaks, best-first.
pub fn scan_full<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    params: &ScanParams,
) -> SlideResult<Vec<Peak>> {
    let (max_x, max_y) = max_placement(image, K::template_size(plan))?;
    scan_roi::<K>(image, plan, 0, 0, max_x, max_y, params)
}

/// Scans placements inside the inclusive rectangle `(x0, y0)..=(x1, y1)`,
/// clamped to the valid range.
pub fn scan_roi<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &K::Plan,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    params: &ScanParams,
) -> SlideResult<Vec<Peak>> {
    let (max_x, max_y) = max_placement(image, K::template_size(plan))?;
    let (x1, y1) = (x1.min(max_x), y1.min(max_y));
    if params.topk == 0 || x0 > x1 || y0 > y1 {
        return Ok(Vec::new());
    }
    let mut topk = TopK::new(params.topk, K::METRIC);
    for y in y0..=y1 {
        topk.extend(scan_row::<K>(image, plan, y, x0, x1, params));
    }
    Ok(topk.into_sorted())
}
