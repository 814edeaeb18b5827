//! Ranger — RAdam with Lookahead.
//!
//! Ranger composes the RAdam inner step with Lookahead (Zhang, Hinton et
//! al.): a slow-moving copy of each parameter is pulled toward the fast
//! (trained) copy every `k` steps, and the fast copy is reset to the
//! interpolation. The periodic pull anchors the fast trajectory to a
//! trailing average.
//!
//! Differences from RAdam, preserved deliberately:
//! - the rectification comparator is strict (`n_sma > n_sma_threshold`,
//!   threshold configurable, default 5) where RAdam uses `n_sma >= 5`;
//! - below the threshold Ranger always falls back to the momentum step,
//!   never to the skip sentinel;
//! - weight decay is applied unconditionally before the branch, not inside
//!   it.

use crate::cache::{CoefficientCache, Fallback, RectifyPolicy};
use crate::error::{OptimError, OptimResult};
use crate::radam::{advance_moments, apply_weight_decay, validate_betas};
use crate::state::ParamState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ranger hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangerConfig {
    /// Learning rate. Must be strictly positive.
    pub lr: f32,

    /// Lookahead slow-update rate, in `[0, 1]`.
    pub alpha: f32,

    /// Lookahead interval in steps. Must be at least 1.
    pub k: u64,

    /// Rectification-validity threshold, compared with strict `>`.
    pub n_sma_threshold: f64,

    /// First moment decay (beta1). 0.95 tends to work better than 0.9 here.
    pub beta1: f32,

    /// Second moment decay (beta2).
    pub beta2: f32,

    /// Epsilon for numerical stability. Must be strictly positive.
    pub epsilon: f32,

    /// Weight decay coefficient.
    pub weight_decay: f32,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            alpha: 0.5,
            k: 6,
            n_sma_threshold: 5.0,
            beta1: 0.95,
            beta2: 0.999,
            epsilon: 1e-5,
            weight_decay: 0.0,
        }
    }
}

impl RangerConfig {
    /// Creates config with learning rate.
    pub fn with_lr(lr: f32) -> Self {
        Self {
            lr,
            ..Default::default()
        }
    }

    /// Validates the hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`OptimError::InvalidHyperparameter`] if `alpha` is outside
    /// `[0, 1]`, `k < 1`, `lr <= 0`, `epsilon <= 0`, either beta is outside
    /// `[0, 1)`, or `weight_decay < 0`.
    pub fn validate(&self) -> OptimResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(OptimError::invalid_hyperparameter("alpha", self.alpha));
        }
        if self.k < 1 {
            return Err(OptimError::invalid_hyperparameter("k", self.k as f64));
        }
        if self.lr <= 0.0 {
            return Err(OptimError::invalid_hyperparameter("lr", self.lr));
        }
        if self.epsilon <= 0.0 {
            return Err(OptimError::invalid_hyperparameter("epsilon", self.epsilon));
        }
        validate_betas((self.beta1, self.beta2))?;
        if self.weight_decay < 0.0 {
            return Err(OptimError::invalid_hyperparameter(
                "weight_decay",
                self.weight_decay,
            ));
        }
        Ok(())
    }
}

/// One Ranger update for a single parameter tensor.
///
/// Runs the RAdam inner step with Ranger's policy, then, on every `k`-th
/// step of this parameter, interpolates the slow buffer toward the fast
/// value and copies the interpolation back.
#[allow(clippy::too_many_arguments)]
pub(crate) fn ranger_update(
    param: &mut [f32],
    grad: &[f32],
    state: &mut ParamState,
    cache: &mut CoefficientCache,
    lr: f32,
    betas: (f32, f32),
    eps: f32,
    weight_decay: f32,
    alpha: f32,
    k: u64,
    n_sma_threshold: f64,
) {
    let (beta1, beta2) = betas;
    advance_moments(state, grad, beta1, beta2);

    let policy = RectifyPolicy {
        threshold: n_sma_threshold,
        exclusive: true,
        fallback: Fallback::Momentum,
    };
    let (n_sma, step_size) =
        cache.coefficients(state.step, f64::from(beta1), f64::from(beta2), policy);

    // Unconditional decay, before the variance branch (unlike RAdam).
    if weight_decay != 0.0 {
        apply_weight_decay(param, weight_decay, lr);
    }

    let scale = lr * step_size as f32;
    if n_sma > n_sma_threshold {
        for ((p, m), v) in param
            .iter_mut()
            .zip(&state.exp_avg)
            .zip(&state.exp_avg_sq)
        {
            *p -= scale * m / (v.sqrt() + eps);
        }
    } else {
        for (p, m) in param.iter_mut().zip(&state.exp_avg) {
            *p -= scale * m;
        }
    }

    // Integrated Lookahead, at the parameter level.
    if state.step % k == 0 {
        if let Some(slow) = state.slow_buffer.as_mut() {
            for (s, p) in slow.iter_mut().zip(param.iter_mut()) {
                *s += alpha * (*p - *s);
                *p = *s;
            }
        }
    }
}
