//! Replays displacement sequences as a pointer drag.

use crate::driver::Pointer;
use crate::geometry::Position;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::trajectory::DisplacementSequence;
use crate::util::{SlideError, SlideResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Pacing of a drag.
#[derive(Clone, Copy, Debug)]
pub struct DragConfig {
    /// Shortest pause between moves.
    pub pause_min: Duration,
    /// Longest pause between moves.
    pub pause_max: Duration,
    /// Seed for reproducible pauses; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            pause_min: Duration::from_millis(30),
            pause_max: Duration::from_millis(80),
            seed: None,
        }
    }
}

/// State of one drag; lives for a single [`DragController::drag`] call.
#[derive(Debug)]
pub struct DragSession<'a> {
    pub origin: Position,
    pub position: Position,
    pub primary: &'a DisplacementSequence,
    pub jitter: &'a DisplacementSequence,
    pub attempt: usize,
}

impl DragSession<'_> {
    /// Advances to step `i` and returns the new pointer position.
    ///
    /// The jitter axis reuses its last element once it runs out.
    fn advance(&mut self, i: usize) -> Position {
        self.position.x += f64::from(self.primary.get_or_last(i));
        self.position.y += f64::from(self.jitter.get_or_last(i));
        self.position
    }
}

/// Drives a [`Pointer`] through a planned gesture with randomized pacing.
pub struct DragController {
    cfg: DragConfig,
    rng: StdRng,
}

impl DragController {
    pub fn new(cfg: DragConfig) -> SlideResult<Self> {
        if cfg.pause_min > cfg.pause_max {
            return Err(SlideError::InvalidConfig("pause_min exceeds pause_max"));
        }
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { cfg, rng })
    }

    pub fn config(&self) -> &DragConfig {
        &self.cfg
    }

    /// Draws the next inter-move pause.
    pub fn next_pause(&mut self) -> Duration {
        let min = self.cfg.pause_min.as_micros() as u64;
        let max = self.cfg.pause_max.as_micros() as u64;
        Duration::from_micros(self.rng.random_range(min..=max))
    }

    /// Presses at `origin`, moves by each step of `primary` (and of
    /// `jitter` on the other axis), then releases.
    ///
    /// Steps are replayed strictly in order. If a move fails the button is
    /// still released on a best-effort basis and the move error is
    /// returned. Returns the final pointer position.
    pub fn drag<P: Pointer + ?Sized>(
        &mut self,
        pointer: &mut P,
        origin: Position,
        primary: &DisplacementSequence,
        jitter: &DisplacementSequence,
        attempt: usize,
    ) -> SlideResult<Position> {
        let _span = trace_span!("drag", attempt = attempt, steps = primary.len()).entered();

        let mut session = DragSession {
            origin,
            position: origin,
            primary,
            jitter,
            attempt,
        };

        pointer.pointer_move(origin.x, origin.y)?;
        pointer.pointer_down()?;
        for i in 0..primary.len() {
            let pos = session.advance(i);
            if let Err(err) = pointer.pointer_move(pos.x, pos.y) {
                trace_warn!("drag_aborted", attempt = attempt, step = i, error = err);
                if let Err(up) = pointer.pointer_up() {
                    trace_warn!("release_failed", attempt = attempt, step = i, error = up);
                }
                return Err(err);
            }
            let pause = self.next_pause();
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
        }
        pointer.pointer_up()?;

        trace_event!(
            "drag_finished",
            attempt = session.attempt,
            dx = session.position.x - session.origin.x,
            dy = session.position.y - session.origin.y
        );
        Ok(session.position)
    }
}
