//! Collaborator interfaces: browser automation, image sources, downloads.
//!
//! The crate never talks to a browser or the network directly. Callers plug
//! in implementations of these traits; tests use in-memory fakes.

use crate::geometry::Rect;
use crate::image::ColorImage;
use crate::trace::trace_warn;
use crate::util::{SlideError, SlideResult};
use crate::vendor::CaptchaVendor;
use std::time::Duration;

/// Pointer control, the only capability a drag needs.
pub trait Pointer {
    fn pointer_move(&mut self, x: f64, y: f64) -> SlideResult<()>;
    fn pointer_down(&mut self) -> SlideResult<()>;
    fn pointer_up(&mut self) -> SlideResult<()>;
}

/// Page-level automation used by the attempt loop.
///
/// Calls that wait on the page report [`SlideError::AutomationTimeout`] when
/// their wait expires; [`with_retries`] turns that into bounded retries.
pub trait Automation: Pointer {
    /// Public connectivity signal of the underlying session.
    fn is_connected(&self) -> bool;

    /// Navigates to `url`, retrying up to `retries` times.
    fn navigate(&mut self, url: &str, retries: u32) -> bool;

    /// Reads attribute `name` of the first element matching `selector`.
    fn attribute(
        &mut self,
        selector: &str,
        name: &str,
        wait: &WaitOptions,
    ) -> SlideResult<Option<String>>;

    /// Page-space box of the first element matching `selector`.
    fn bounding_box(&mut self, selector: &str, wait: &WaitOptions) -> SlideResult<Rect>;

    /// Whether an element matching `selector` is currently visible.
    fn is_visible(&mut self, selector: &str) -> bool;
}

/// Wait settings carried explicitly through a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    /// Per-call wait budget handed to the automation layer.
    pub timeout: Duration,
    /// Extra tries after a timed-out call.
    pub retries: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retries: 2,
        }
    }
}

/// Runs `op`, retrying on [`SlideError::AutomationTimeout`] up to
/// `wait.retries` extra times. Other errors return immediately.
pub fn with_retries<T>(
    action: &str,
    wait: &WaitOptions,
    mut op: impl FnMut() -> SlideResult<T>,
) -> SlideResult<T> {
    let tries = wait.retries.saturating_add(1);
    for attempt in 1..=tries {
        match op() {
            Err(SlideError::AutomationTimeout { .. }) if attempt < tries => {
                trace_warn!("automation_retry", action = action, attempt = attempt);
            }
            Err(SlideError::AutomationTimeout { .. }) => break,
            other => return other,
        }
    }
    Err(SlideError::AutomationTimeout {
        action: action.to_string(),
        attempts: tries,
    })
}

/// Fetches raw bytes from a URL.
pub trait Downloader {
    fn download(&mut self, url: &str) -> SlideResult<Vec<u8>>;
}

/// The image pair of one captcha challenge.
#[derive(Clone, Debug)]
pub struct CaptchaImages {
    /// Opaque background containing the gap.
    pub background: ColorImage,
    /// Puzzle piece with transparency (RGBA).
    pub piece: ColorImage,
}

/// Produces the current challenge's images.
pub trait ImageSource {
    fn fetch(
        &mut self,
        automation: &mut dyn Automation,
        vendor: &dyn CaptchaVendor,
        wait: &WaitOptions,
        attempt: usize,
    ) -> SlideResult<CaptchaImages>;
}
