//! Top-K candidate tracking for match peaks.

use crate::locate::{Extremum, Metric};
use std::cmp::Ordering;

/// Candidate placement (top-left corner) with its raw metric score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the placement.
    pub x: usize,
    /// Y coordinate (row) of the placement.
    pub y: usize,
    /// Score under the metric that produced the peak.
    pub score: f32,
}

/// Orders peaks best-first under `metric`, breaking ties by row then column.
pub(crate) fn peak_cmp(metric: Metric, a: &Peak, b: &Peak) -> Ordering {
    let by_score = match metric.extremum() {
        Extremum::Max => b.score.total_cmp(&a.score),
        Extremum::Min => a.score.total_cmp(&b.score),
    };
    by_score
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks best-first with deterministic tie-breaking.
pub(crate) fn sort_peaks(metric: Metric, peaks: &mut [Peak]) {
    peaks.sort_by(|a, b| peak_cmp(metric, a, b));
}

/// Keeps the `k` best peaks with O(k) insertion cost.
#[derive(Debug)]
pub struct TopK {
    k: usize,
    metric: Metric,
    items: Vec<Peak>,
}

impl TopK {
    /// Creates a collector ranking by `metric`.
    pub fn new(k: usize, metric: Metric) -> Self {
        Self {
            k,
            metric,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a peak, evicting the worst one if at capacity.
    pub fn push(&mut self, peak: Peak) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(peak);
            return;
        }

        let metric = self.metric;
        let mut worst_idx = 0usize;
        for (idx, item) in self.items.iter().enumerate().skip(1) {
            if peak_cmp(metric, item, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if peak_cmp(metric, &peak, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = peak;
        }
    }

    /// Merges another collector's peaks into this one.
    pub fn extend(&mut self, other: TopK) {
        for peak in other.items {
            self.push(peak);
        }
    }

    /// Returns the kept peaks best-first.
    pub fn into_sorted(mut self) -> Vec<Peak> {
        sort_peaks(self.metric, &mut self.items);
        self.items
    }
}
