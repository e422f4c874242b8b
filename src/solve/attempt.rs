//! The retry loop around a single solve-and-drag attempt.

use crate::drag::DragController;
use crate::driver::{with_retries, Automation, ImageSource, WaitOptions};
use crate::solve::SliderSolver;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SlideError, SlideResult};
use crate::vendor::{CaptchaVendor, VendorRegistry};
use std::time::Duration;

/// Loop pacing and bounds.
#[derive(Clone, Copy, Debug)]
pub struct LoopConfig {
    pub max_attempts: usize,
    /// Pause before the next attempt after a failure.
    pub retry_delay: Duration,
    /// Pause between releasing the pointer and checking for success.
    pub settle_delay: Duration,
    pub wait: WaitOptions,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
            wait: WaitOptions::default(),
        }
    }
}

/// How a session ended. Running out of attempts is a normal outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The success indicator appeared after attempt `attempts`.
    Solved { attempts: usize },
    /// Every attempt ran without success.
    Exhausted { attempts: usize },
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved { .. })
    }
}

/// Sequences fetch, solve, drag and check, retrying up to a bound.
pub struct SolveLoop {
    vendor: Box<dyn CaptchaVendor>,
    solver: SliderSolver,
    drag: DragController,
    cfg: LoopConfig,
}

impl SolveLoop {
    pub fn new(
        vendor: Box<dyn CaptchaVendor>,
        solver: SliderSolver,
        drag: DragController,
        cfg: LoopConfig,
    ) -> SlideResult<Self> {
        if cfg.max_attempts == 0 {
            return Err(SlideError::InvalidConfig("max_attempts must be at least 1"));
        }
        Ok(Self {
            vendor,
            solver,
            drag,
            cfg,
        })
    }

    /// Builds a loop for the vendor registered under `name`.
    pub fn from_registry(
        registry: &mut VendorRegistry,
        name: &str,
        solver: SliderSolver,
        drag: DragController,
        cfg: LoopConfig,
    ) -> SlideResult<Self> {
        let vendor = registry.take(name)?;
        Self::new(vendor, solver, drag, cfg)
    }

    pub fn vendor(&self) -> &dyn CaptchaVendor {
        self.vendor.as_ref()
    }

    /// Runs attempts until the success indicator shows or the budget is
    /// spent.
    ///
    /// Attempt-local failures are logged and retried. Errors for which
    /// [`SlideError::is_fatal`] holds end the session immediately.
    pub fn run(
        &mut self,
        automation: &mut dyn Automation,
        source: &mut dyn ImageSource,
    ) -> SlideResult<Outcome> {
        let max_attempts = self.cfg.max_attempts;
        for attempt in 1..=max_attempts {
            let _span = trace_span!("attempt", attempt = attempt).entered();
            match self.attempt(automation, source, attempt) {
                Ok(true) => {
                    trace_event!("captcha_solved", attempt = attempt);
                    return Ok(Outcome::Solved { attempts: attempt });
                }
                Ok(false) => {
                    trace_warn!("attempt_rejected", attempt = attempt);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    trace_warn!("attempt_failed", attempt = attempt, error = err);
                }
            }
            if attempt < max_attempts {
                pause(self.cfg.retry_delay);
            }
        }
        trace_warn!("attempts_exhausted", attempts = max_attempts);
        Ok(Outcome::Exhausted {
            attempts: max_attempts,
        })
    }

    fn attempt(
        &mut self,
        automation: &mut dyn Automation,
        source: &mut dyn ImageSource,
        attempt: usize,
    ) -> SlideResult<bool> {
        if !automation.is_connected() {
            return Err(SlideError::SessionClosed);
        }
        let wait = self.cfg.wait;
        let vendor = self.vendor.as_ref();

        let images = source.fetch(automation, vendor, &wait, attempt)?;
        let solution = self
            .solver
            .solve(&images.background, &images.piece, vendor.scale_factor())?;
        trace_event!(
            "attempt_planned",
            attempt = attempt,
            gap_x = solution.gap.location.x,
            gap_y = solution.gap.location.y,
            distance = solution.distance,
            steps = solution.primary.len()
        );

        let handle = vendor.handle_selector();
        let rect = with_retries("bounding_box", &wait, || {
            automation.bounding_box(handle, &wait)
        })
        .inspect_err(|err| {
            trace_warn!(
                "handle_not_found",
                attempt = attempt,
                gap_x = solution.gap.location.x,
                error = err
            );
        })?;

        self.drag.drag(
            &mut *automation,
            rect.center(),
            &solution.primary,
            &solution.jitter,
            attempt,
        )?;
        pause(self.cfg.settle_delay);
        Ok(automation.is_visible(vendor.success_selector()))
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
