//! Human-like drag trajectories from bounded-acceleration kinematics.
//!
//! A trajectory is a [`DisplacementSequence`]: per-quantum position deltas
//! that speed up until a threshold fraction of the travel, slow down
//! afterwards, optionally overshoot the target and pull back, and always
//! sum to the requested distance.

use crate::trace::{trace_event, trace_span};
use crate::util::{SlideError, SlideResult};

/// Ordered per-step displacements whose sum is the planned distance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplacementSequence {
    steps: Vec<i32>,
}

impl DisplacementSequence {
    pub fn steps(&self) -> &[i32] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of all displacements.
    pub fn total(&self) -> i64 {
        self.steps.iter().map(|&s| i64::from(s)).sum()
    }

    /// Step `i`, or the last step once `i` runs past the end.
    ///
    /// An empty sequence yields 0 everywhere.
    pub fn get_or_last(&self, i: usize) -> i32 {
        self.steps
            .get(i)
            .or_else(|| self.steps.last())
            .copied()
            .unwrap_or(0)
    }

    pub fn into_steps(self) -> Vec<i32> {
        self.steps
    }
}

impl From<Vec<i32>> for DisplacementSequence {
    fn from(steps: Vec<i32>) -> Self {
        Self { steps }
    }
}

/// Kinematic parameters of the planner.
#[derive(Clone, Copy, Debug)]
pub struct PlanConfig {
    /// Acceleration magnitude in units per quantum squared.
    pub acceleration: f64,
    /// Fraction of `distance + overflow` after which the motion decelerates.
    pub threshold_ratio: f64,
    /// Upper bound on steps per phase.
    pub max_steps: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            acceleration: 20.0,
            threshold_ratio: 0.6,
            max_steps: 100_000,
        }
    }
}

/// Converts a target distance into a displacement sequence.
#[derive(Clone, Debug, Default)]
pub struct TrajectoryPlanner {
    cfg: PlanConfig,
}

impl TrajectoryPlanner {
    pub fn new(cfg: PlanConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.cfg
    }

    /// Plans a motion of `distance` units sampled every `time_quantum`.
    ///
    /// With `overflow > 0` the forward phase runs to `distance + overflow`
    /// and a correction phase pulls back toward `distance`. A final element
    /// always snaps the sum to exactly `distance`.
    pub fn plan(
        &self,
        distance: i32,
        time_quantum: f64,
        overflow: i32,
    ) -> SlideResult<DisplacementSequence> {
        if distance <= 0 {
            return Err(SlideError::InvalidInput("distance must be positive"));
        }
        if !time_quantum.is_finite() || time_quantum <= 0.0 {
            return Err(SlideError::InvalidInput("time quantum must be positive"));
        }
        if overflow < 0 {
            return Err(SlideError::InvalidInput("overflow must be non-negative"));
        }
        if !(self.cfg.acceleration.is_finite() && self.cfg.acceleration > 0.0) {
            return Err(SlideError::InvalidConfig("acceleration must be positive"));
        }

        let _span = trace_span!("plan", distance = distance, overflow = overflow).entered();

        let t = time_quantum;
        let accel = self.cfg.acceleration;
        let target = f64::from(distance) + f64::from(overflow);
        let threshold = self.cfg.threshold_ratio * target;
        let step = |velocity: f64, a: f64| velocity * t + 0.5 * a * t * t;
        // Ties round toward positive infinity.
        let quantize = |delta: f64| (delta + 0.5).floor() as i32;

        let mut steps = Vec::new();
        let mut velocity = 0.0f64;
        let mut position = 0.0f64;
        while position < target {
            if steps.len() >= self.cfg.max_steps {
                return Err(SlideError::TrajectoryTooLong {
                    max_steps: self.cfg.max_steps,
                });
            }
            let a = if position < threshold { accel } else { -accel };
            let delta = step(velocity, a);
            velocity += a * t;
            position += delta;
            steps.push(quantize(delta));
        }
        let forward_len = steps.len();

        if overflow > 0 {
            // The running total stays integral and is truncated after every
            // pull-back, so it can drift below the true sum of the steps.
            let mut total: i64 = steps.iter().map(|&s| i64::from(s)).sum();
            let distance = i64::from(distance);
            let mut corrections = 0usize;
            while total > distance && total < 2 * distance {
                if corrections >= self.cfg.max_steps {
                    return Err(SlideError::TrajectoryTooLong {
                        max_steps: self.cfg.max_steps,
                    });
                }
                let delta = step(velocity, -accel);
                velocity -= accel * t;
                total = (total as f64 - delta) as i64;
                steps.push(-quantize(delta));
                corrections += 1;
            }
        }

        let sum: i64 = steps.iter().map(|&s| i64::from(s)).sum();
        steps.push((i64::from(distance) - sum) as i32);

        trace_event!(
            "trajectory_planned",
            forward = forward_len,
            total = steps.len()
        );
        Ok(DisplacementSequence { steps })
    }
}
