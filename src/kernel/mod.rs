//! Per-placement scoring kernels and dense scans.

use crate::image::ImageView;
use crate::locate::Metric;
use crate::util::SlideResult;

/// Scan configuration for kernel evaluations.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Maximum number of peaks to retain.
    pub topk: usize,
    /// Minimum window variance for correlation scores; flatter windows are
    /// skipped because their correlation is undefined.
    pub min_var_i: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            topk: 1,
            min_var_i: 1e-8,
        }
    }
}

/// Scores one template placement under a fixed metric.
pub trait Kernel {
    /// Precomputed template data.
    type Plan: Sync;

    /// Metric this kernel scores with; decides which extremum is best.
    const METRIC: Metric;

    /// Precomputes template statistics.
    fn plan(tpl: ImageView<'_, u8>) -> SlideResult<Self::Plan>;

    /// Template `(width, height)`.
    fn template_size(plan: &Self::Plan) -> (usize, usize);

    /// Score with the template's top-left corner at `(x, y)`.
    ///
    /// Returns `None` when the placement is out of range or the score is
    /// undefined for that window.
    fn score_at(
        image: ImageView<'_, u8>,
        plan: &Self::Plan,
        x: usize,
        y: usize,
        params: &ScanParams,
    ) -> Option<f32>;
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;
