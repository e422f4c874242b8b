//! SlideMatch solves slider captchas: it finds the puzzle gap in a
//! background image by template matching, plans a human-like drag toward
//! it and replays that drag through a pluggable automation driver.
//!
//! The pipeline is split into pure stages ([`preprocess`], [`locate`],
//! [`trajectory`]) composed by [`SliderSolver`], and an I/O shell
//! ([`drag`], [`driver`], [`SolveLoop`]) that retries attempts against a
//! live page. Dense scans can run in parallel via the `rayon` feature.

mod candidate;
pub mod drag;
pub mod driver;
pub mod geometry;
pub mod image;
pub mod kernel;
pub mod locate;
pub mod lowlevel;
pub mod preprocess;
pub mod solve;
pub mod template;
mod trace;
pub mod trajectory;
pub mod util;
pub mod vendor;

pub use drag::{DragConfig, DragController};
pub use driver::{Automation, CaptchaImages, Downloader, ImageSource, Pointer, WaitOptions};
pub use geometry::{BoundingBox, Point, Position, Rect};
pub use image::{ColorImage, ImageView, OwnedImage, PixelLayout};
pub use locate::{GapLocator, LocateConfig, MatchResult, Metric};
pub use solve::{LoopConfig, Outcome, SliderSolver, Solution, SolveConfig, SolveLoop};
#[cfg(feature = "image-io")]
pub use solve::DownloadingSource;
pub use template::Template;
pub use trajectory::{DisplacementSequence, PlanConfig, TrajectoryPlanner};
pub use util::{SlideError, SlideResult};
pub use vendor::{CaptchaVendor, ShumeiVendor, VendorRegistry};
