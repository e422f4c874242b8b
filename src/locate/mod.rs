//! Gap localization by dense template matching.
//!
//! The primary pass matches the cropped piece (grayscale) against the
//! binarized background. Which score counts as "best" is a property of the
//! [`Metric`]: correlation is maximized, squared difference minimized. All
//! ranking in this crate goes through [`Metric::is_better`], so switching
//! the metric never requires touching the selection code.

use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::geometry::Point;
use crate::image::{ColorImage, ImageView};
#[cfg(feature = "rayon")]
use crate::kernel::rayon::scan_full_par;
use crate::kernel::scalar::{max_placement, scan_full, SqDiffScalar, ZnccScalar};
use crate::kernel::{Kernel, ScanParams};
use crate::trace::{trace_event, trace_span};
use crate::util::{SlideError, SlideResult};

mod annotate;

pub use annotate::{annotate, draw_rect, MARK_COLOR, MARK_THICKNESS};
#[cfg(feature = "image-io")]
pub use annotate::{save_annotated, ANNOTATED_FILE, ANNOTATED_RAW_FILE};

/// Which end of the score range marks the best match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

/// Similarity metric used for template matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Metric {
    /// Zero-mean normalized cross-correlation in `[-1, 1]`; maximized.
    #[default]
    Zncc,
    /// Normalized squared difference in `[0, inf)`; minimized.
    SqDiffNormed,
}

impl Metric {
    /// The extremum that identifies the best match under this metric.
    pub fn extremum(self) -> Extremum {
        match self {
            Metric::Zncc => Extremum::Max,
            Metric::SqDiffNormed => Extremum::Min,
        }
    }

    /// Returns true when score `a` is strictly better than `b`.
    pub fn is_better(self, a: f32, b: f32) -> bool {
        match self.extremum() {
            Extremum::Max => a > b,
            Extremum::Min => a < b,
        }
    }
}

/// Best placement of the template's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub location: Point,
    pub score: f32,
    /// Metric that produced `score`; needed to compare results.
    pub metric: Metric,
}

impl MatchResult {
    fn from_peak(peak: Peak, metric: Metric) -> Self {
        Self {
            location: Point::new(peak.x as i32, peak.y as i32),
            score: peak.score,
            metric,
        }
    }
}

/// Matching configuration.
#[derive(Clone, Copy, Debug)]
pub struct LocateConfig {
    pub metric: Metric,
    /// Use the row-parallel scan when the `rayon` feature is enabled.
    pub parallel: bool,
    /// Windows flatter than this are skipped under correlation.
    pub min_var_i: f64,
    /// Peaks collected before suppression in [`GapLocator::locate_topk`].
    pub candidate_pool: usize,
    /// Chebyshev radius for non-maximum suppression.
    pub nms_radius: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Zncc,
            parallel: false,
            min_var_i: 1e-8,
            candidate_pool: 64,
            nms_radius: 4,
        }
    }
}

/// Finds where a template sits inside a search image.
#[derive(Clone, Debug, Default)]
pub struct GapLocator {
    cfg: LocateConfig,
}

impl GapLocator {
    pub fn new(cfg: LocateConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &LocateConfig {
        &self.cfg
    }

    /// Returns the best placement of `template` inside `background`.
    ///
    /// Every offset with `0 <= x <= bw - tw` and `0 <= y <= bh - th` is
    /// scored. Ties resolve to the smallest `(y, x)`.
    pub fn locate(
        &self,
        background: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
    ) -> SlideResult<MatchResult> {
        let _span = trace_span!(
            "locate",
            tpl_width = template.width(),
            tpl_height = template.height()
        )
        .entered();

        let best = self
            .scan(background, template, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| no_window(background, template))?;
        let result = MatchResult::from_peak(best, self.cfg.metric);
        trace_event!(
            "gap_located",
            x = result.location.x,
            y = result.location.y,
            score = result.score
        );
        Ok(result)
    }

    /// Returns up to `k` well-separated candidates, best-first.
    pub fn locate_topk(
        &self,
        background: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        k: usize,
    ) -> SlideResult<Vec<MatchResult>> {
        let pool = self.cfg.candidate_pool.max(k);
        let mut peaks = self.scan(background, template, pool)?;
        let mut kept = nms_2d(&mut peaks, self.cfg.metric, self.cfg.nms_radius);
        kept.truncate(k);
        Ok(kept
            .into_iter()
            .map(|p| MatchResult::from_peak(p, self.cfg.metric))
            .collect())
    }

    /// Secondary pass on the raw images: grayscale background against the
    /// grayscale piece.
    ///
    /// The result is informational; it may disagree with [`Self::locate`]
    /// on the binarized background.
    pub fn cross_check(
        &self,
        background: &ColorImage,
        piece: &ColorImage,
    ) -> SlideResult<MatchResult> {
        let bg = background.to_gray();
        let tpl = piece.to_gray();
        self.locate(bg.view(), tpl.view())
    }

    fn scan(
        &self,
        background: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        topk: usize,
    ) -> SlideResult<Vec<Peak>> {
        max_placement(background, (template.width(), template.height()))?;
        let params = ScanParams {
            topk,
            min_var_i: self.cfg.min_var_i,
        };
        match self.cfg.metric {
            Metric::Zncc => self.scan_with::<ZnccScalar>(background, template, &params),
            Metric::SqDiffNormed => self.scan_with::<SqDiffScalar>(background, template, &params),
        }
    }

    fn scan_with<K: Kernel>(
        &self,
        background: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        params: &ScanParams,
    ) -> SlideResult<Vec<Peak>> {
        let plan = K::plan(template)?;
        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                return scan_full_par::<K>(background, &plan, params);
            }
        }
        scan_full::<K>(background, &plan, params)
    }
}

fn no_window(background: ImageView<'_, u8>, template: ImageView<'_, u8>) -> SlideError {
    SlideError::NoValidMatchWindow {
        tpl_width: template.width(),
        tpl_height: template.height(),
        img_width: background.width(),
        img_height: background.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Extremum, GapLocator, LocateConfig, Metric};
    use crate::geometry::Point;
    use crate::image::ImageView;
    use crate::util::SlideError;

    #[test]
    fn metrics_declare_their_extremum() {
        assert_eq!(Metric::Zncc.extremum(), Extremum::Max);
        assert_eq!(Metric::SqDiffNormed.extremum(), Extremum::Min);
        assert!(Metric::Zncc.is_better(0.9, 0.1));
        assert!(Metric::SqDiffNormed.is_better(0.1, 0.9));
    }

    #[test]
    fn oversized_template_has_no_window() {
        let bg = [0u8; 12];
        let tpl = [1u8; 20];
        let bg = ImageView::from_slice(&bg, 4, 3).unwrap();
        let tpl = ImageView::from_slice(&tpl, 5, 4).unwrap();
        let err = GapLocator::default().locate(bg, tpl).unwrap_err();
        assert_eq!(
            err,
            SlideError::NoValidMatchWindow {
                tpl_width: 5,
                tpl_height: 4,
                img_width: 4,
                img_height: 3,
            }
        );
    }

    #[test]
    fn flat_background_has_no_scorable_window() {
        let bg = [0u8; 100];
        let tpl = [0u8, 255, 255, 0];
        let bg = ImageView::from_slice(&bg, 10, 10).unwrap();
        let tpl = ImageView::from_slice(&tpl, 2, 2).unwrap();
        let err = GapLocator::default().locate(bg, tpl).unwrap_err();
        assert!(matches!(err, SlideError::NoValidMatchWindow { .. }));
    }

    #[test]
    fn both_metrics_agree_on_exact_paste() {
        let (w, h) = (32, 20);
        let mut bg = vec![0u8; w * h];
        for (i, v) in bg.iter_mut().enumerate() {
            *v = ((i * 37) % 251) as u8;
        }
        let tpl: Vec<u8> = (0..6 * 5).map(|i| ((i * 53 + 11) % 256) as u8).collect();
        for ty in 0..5 {
            for tx in 0..6 {
                bg[(9 + ty) * w + 21 + tx] = tpl[ty * 6 + tx];
            }
        }
        let bg = ImageView::from_slice(&bg, w, h).unwrap();
        let tpl = ImageView::from_slice(&tpl, 6, 5).unwrap();
        for metric in [Metric::Zncc, Metric::SqDiffNormed] {
            let locator = GapLocator::new(LocateConfig {
                metric,
                ..LocateConfig::default()
            });
            let found = locator.locate(bg, tpl).unwrap();
            assert_eq!(found.location, Point::new(21, 9), "{metric:?}");
            assert_eq!(found.metric, metric);
        }
    }
}
