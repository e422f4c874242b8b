//! Template statistics precomputed once per match.

use crate::image::ImageView;
use crate::util::{SlideError, SlideResult};

fn for_each_pixel(tpl: ImageView<'_, u8>, mut f: impl FnMut(f32)) {
    for y in 0..tpl.height() {
        if let Some(row) = tpl.row(y) {
            for &value in row {
                f(f32::from(value));
            }
        }
    }
}

/// Zero-mean template for normalized cross-correlation.
///
/// With `t' = t - mean(t)`, the score at a window `I` is
/// `sum(t' * I) / sqrt(sum(t'^2) * var(I))`, where
/// `var(I) = sum(I^2) - sum(I)^2 / n`. Scores lie in `[-1, 1]`.
#[derive(Clone, Debug)]
pub struct ZnccPlan {
    width: usize,
    height: usize,
    var_t: f32,
    t_prime: Vec<f32>,
}

impl ZnccPlan {
    /// Builds a plan from a template view.
    ///
    /// Fails with [`SlideError::DegenerateTemplate`] for a flat template,
    /// whose correlation is undefined everywhere.
    pub fn from_view(tpl: ImageView<'_, u8>) -> SlideResult<Self> {
        let count = tpl.width() * tpl.height();
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for_each_pixel(tpl, |v| {
            sum += f64::from(v);
            sum_sq += f64::from(v) * f64::from(v);
        });

        let mean = sum / count as f64;
        let var_t = sum_sq - sum * mean;
        if var_t <= 1e-8 {
            return Err(SlideError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        let mean = mean as f32;
        let mut t_prime = Vec::with_capacity(count);
        for_each_pixel(tpl, |v| t_prime.push(v - mean));

        Ok(Self {
            width: tpl.width(),
            height: tpl.height(),
            var_t: var_t as f32,
            t_prime,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of squared zero-mean template values.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Zero-mean template values in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

/// Raw template for normalized squared difference.
///
/// The score at a window `I` is
/// `sum((t - I)^2) / sqrt(sum(t^2) * sum(I^2))`; 0 is a perfect match.
#[derive(Clone, Debug)]
pub struct SqDiffPlan {
    width: usize,
    height: usize,
    sum_sq: f32,
    data: Vec<f32>,
}

impl SqDiffPlan {
    /// Builds a plan from a template view.
    ///
    /// An all-black template has no energy to normalize against and is
    /// rejected as degenerate.
    pub fn from_view(tpl: ImageView<'_, u8>) -> SlideResult<Self> {
        let mut data = Vec::with_capacity(tpl.width() * tpl.height());
        let mut sum_sq = 0.0f64;
        for_each_pixel(tpl, |v| {
            data.push(v);
            sum_sq += f64::from(v) * f64::from(v);
        });
        if sum_sq <= 0.0 {
            return Err(SlideError::DegenerateTemplate {
                reason: "zero energy",
            });
        }
        Ok(Self {
            width: tpl.width(),
            height: tpl.height(),
            sum_sq: sum_sq as f32,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum of squared template values.
    pub fn sum_sq(&self) -> f32 {
        self.sum_sq
    }

    /// Template values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::{SqDiffPlan, ZnccPlan};
    use crate::image::ImageView;
    use crate::util::SlideError;

    #[test]
    fn flat_template_is_degenerate_for_zncc() {
        let data = [7u8; 6];
        let view = ImageView::from_slice(&data, 3, 2).unwrap();
        assert_eq!(
            ZnccPlan::from_view(view).unwrap_err(),
            SlideError::DegenerateTemplate {
                reason: "zero variance"
            }
        );
        assert!(SqDiffPlan::from_view(view).is_ok());
    }

    #[test]
    fn zncc_plan_is_zero_mean() {
        let data = [0u8, 10, 20, 30];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let plan = ZnccPlan::from_view(view).unwrap();
        let sum: f32 = plan.t_prime().iter().sum();
        assert!(sum.abs() < 1e-4);
        assert!((plan.var_t() - 500.0).abs() < 1e-3);
    }
}
