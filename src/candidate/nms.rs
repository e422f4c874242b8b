//! Non-maximum suppression for match candidates.

use crate::candidate::topk::{sort_peaks, Peak};
use crate::locate::Metric;

/// Applies 2D non-maximum suppression using Chebyshev distance.
///
/// Peaks are ranked best-first under `metric` and kept if they are farther
/// than `radius` from every previously kept peak.
pub fn nms_2d(peaks: &mut [Peak], metric: Metric, radius: usize) -> Vec<Peak> {
    sort_peaks(metric, peaks);
    if radius == 0 {
        return peaks.to_vec();
    }

    let mut kept: Vec<Peak> = Vec::new();
    'outer: for peak in peaks.iter().copied() {
        for kept_peak in &kept {
            let dx = peak.x.abs_diff(kept_peak.x);
            let dy = peak.y.abs_diff(kept_peak.y);
            if dx.max(dy) <= radius {
                continue 'outer;
            }
        }
        kept.push(peak);
    }

    kept
}
