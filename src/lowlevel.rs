//! Low-level building blocks for custom gap-search pipelines.
//!
//! These expose template plans, kernels, dense scans and candidate pruning
//! beneath [`GapLocator`](crate::GapLocator). Most callers only need the
//! solver types re-exported at the crate root.

pub use crate::candidate::nms::nms_2d;
pub use crate::candidate::topk::{Peak, TopK};
pub use crate::kernel::scalar::{scan_full, scan_roi, SqDiffScalar, ZnccScalar};
#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::scan_full_par;
pub use crate::kernel::{Kernel, ScanParams};
pub use crate::locate::Extremum;
pub use crate::preprocess::{dilate_3x3, erode_3x3, open_3x3, otsu_threshold, threshold_binary_inv};
pub use crate::template::{SqDiffPlan, ZnccPlan};
