//! End-to-end solving: images in, displacement sequences out.
//!
//! [`SliderSolver`] is the pure part (no I/O beyond optional debug images).
//! [`SolveLoop`] wraps it with the automation collaborator and retries.

use crate::geometry::BoundingBox;
use crate::image::ColorImage;
use crate::locate::{GapLocator, LocateConfig, MatchResult};
use crate::preprocess::preprocess;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::trajectory::{DisplacementSequence, PlanConfig, TrajectoryPlanner};
use crate::util::{SlideError, SlideResult};

mod attempt;
#[cfg(test)]
mod fixtures;
#[cfg(feature = "image-io")]
mod source;

pub use attempt::{LoopConfig, Outcome, SolveLoop};
#[cfg(feature = "image-io")]
pub use source::DownloadingSource;

/// File name of the cropped piece written to the debug directory.
#[cfg(feature = "image-io")]
pub const PIECE_CROPPED_FILE: &str = "piece-cropped.png";

/// Parameters of one solve.
#[derive(Clone, Debug)]
pub struct SolveConfig {
    pub locate: LocateConfig,
    pub plan: PlanConfig,
    /// Time quantum of the primary (horizontal) trajectory.
    pub primary_quantum: f64,
    /// Deliberate overshoot of the primary trajectory.
    pub overflow: i32,
    /// Total drift of the secondary (vertical) axis.
    pub jitter_distance: i32,
    /// Time quantum of the secondary trajectory.
    pub jitter_quantum: f64,
    /// Also match the raw images and log disagreements.
    pub cross_check: bool,
    /// Directory for debug overlays; nothing is written when `None`.
    #[cfg(feature = "image-io")]
    pub debug_dir: Option<std::path::PathBuf>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            locate: LocateConfig::default(),
            plan: PlanConfig::default(),
            primary_quantum: 0.2,
            overflow: 20,
            jitter_distance: 10,
            jitter_quantum: 0.1,
            cross_check: true,
            #[cfg(feature = "image-io")]
            debug_dir: None,
        }
    }
}

/// Everything computed for one challenge.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Gap location from the binarized pass.
    pub gap: MatchResult,
    /// Gap location from the raw-image pass, when enabled and successful.
    pub cross_check: Option<MatchResult>,
    /// Opaque content of the piece inside its image.
    pub piece_bbox: BoundingBox,
    /// Horizontal drag distance after scaling.
    pub distance: i32,
    /// Horizontal displacements.
    pub primary: DisplacementSequence,
    /// Vertical displacements.
    pub jitter: DisplacementSequence,
}

/// Runs preprocessing, localization and planning for one image pair.
#[derive(Clone, Debug, Default)]
pub struct SliderSolver {
    cfg: SolveConfig,
    locator: GapLocator,
    planner: TrajectoryPlanner,
}

impl SliderSolver {
    pub fn new(cfg: SolveConfig) -> Self {
        Self {
            locator: GapLocator::new(cfg.locate),
            planner: TrajectoryPlanner::new(cfg.plan),
            cfg,
        }
    }

    pub fn config(&self) -> &SolveConfig {
        &self.cfg
    }

    /// Solves from decoded images.
    ///
    /// `scale_factor` maps image pixels to page pixels; the scaled offset is
    /// truncated toward zero. A non-positive distance is rejected.
    pub fn solve(
        &self,
        background: &ColorImage,
        piece: &ColorImage,
        scale_factor: f64,
    ) -> SlideResult<Solution> {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(SlideError::InvalidInput("scale factor must be positive"));
        }
        let _span = trace_span!("solve", scale = scale_factor).entered();

        let prepared = preprocess(background, piece)?;
        let gap = self
            .locator
            .locate(prepared.background.view(), prepared.template.view())?;

        let cross_check = if self.cfg.cross_check {
            match self.locator.cross_check(background, &prepared.piece) {
                Ok(raw) => {
                    if raw.location != gap.location {
                        trace_warn!(
                            "cross_check_disagrees",
                            gap_x = gap.location.x,
                            raw_x = raw.location.x
                        );
                    }
                    Some(raw)
                }
                Err(err) => {
                    trace_warn!("cross_check_failed", error = err);
                    None
                }
            }
        } else {
            None
        };

        #[cfg(feature = "image-io")]
        self.persist_debug(background, &prepared.piece, &gap, cross_check.as_ref());

        let distance = (f64::from(gap.location.x) * scale_factor).trunc() as i32;
        trace_event!(
            "gap_scaled",
            gap_x = gap.location.x,
            gap_y = gap.location.y,
            distance = distance
        );
        if distance <= 0 {
            return Err(SlideError::InvalidInput("scaled gap offset must be positive"));
        }

        let primary = self
            .planner
            .plan(distance, self.cfg.primary_quantum, self.cfg.overflow)?;
        let jitter = self
            .planner
            .plan(self.cfg.jitter_distance, self.cfg.jitter_quantum, 0)?;

        Ok(Solution {
            gap,
            cross_check,
            piece_bbox: prepared.piece_bbox,
            distance,
            primary,
            jitter,
        })
    }

    /// Solves from image files: the background is read opaque, the piece
    /// with its alpha channel.
    #[cfg(feature = "image-io")]
    pub fn solve_files<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(
        &self,
        background_path: P,
        piece_path: Q,
        scale_factor: f64,
    ) -> SlideResult<Solution> {
        use crate::image::io::load_color;
        use crate::image::PixelLayout;

        let background = load_color(background_path, PixelLayout::Bgr8)?;
        let piece = load_color(piece_path, PixelLayout::Rgba8)?;
        self.solve(&background, &piece, scale_factor)
    }

    #[cfg(feature = "image-io")]
    fn persist_debug(
        &self,
        background: &ColorImage,
        piece: &ColorImage,
        gap: &MatchResult,
        raw: Option<&MatchResult>,
    ) {
        use crate::image::io::save_color;
        use crate::locate::{save_annotated, ANNOTATED_FILE, ANNOTATED_RAW_FILE};

        let Some(dir) = self.cfg.debug_dir.as_deref() else {
            return;
        };
        let size = (piece.width(), piece.height());
        let mut written = vec![
            save_annotated(dir, ANNOTATED_FILE, background, gap, size),
            save_color(dir.join(PIECE_CROPPED_FILE), piece).map(|_| dir.join(PIECE_CROPPED_FILE)),
        ];
        if let Some(raw) = raw {
            written.push(save_annotated(dir, ANNOTATED_RAW_FILE, background, raw, size));
        }
        for result in written {
            if let Err(err) = result {
                trace_warn!("debug_image_failed", error = err);
            }
        }
    }
}
