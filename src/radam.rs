//! Rectified Adam (RAdam).
//!
//! RAdam (Liu et al., 2019) addresses Adam's early-training variance
//! problem: the adaptive learning rate is unreliable while the second-moment
//! average has seen too few samples. The rectification term `n_sma`
//! estimates that effective sample size; while `n_sma < 5` the update either
//! degenerates to a bias-corrected momentum step or — with
//! `degenerated_to_sgd` disabled — skips the parameter write entirely while
//! still advancing the moments and step counter.
//!
//! Weight decay is applied to the parameter directly (`p -= wd * lr * p`),
//! inside whichever branch is taken.

use crate::cache::{CoefficientCache, Fallback, RectifyPolicy};
use crate::error::{OptimError, OptimResult};
use crate::state::ParamState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed validity threshold for RAdam's rectified branch (`n_sma >= 5`).
pub const RADAM_N_SMA_THRESHOLD: f64 = 5.0;

/// RAdam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RAdamConfig {
    /// Learning rate.
    pub lr: f32,

    /// First moment decay (beta1).
    pub beta1: f32,

    /// Second moment decay (beta2).
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,

    /// Weight decay coefficient.
    pub weight_decay: f32,

    /// Fall back to a momentum step while the variance estimate is
    /// unreliable. When disabled, those steps leave the parameter untouched.
    pub degenerated_to_sgd: bool,
}

impl Default for RAdamConfig {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
            degenerated_to_sgd: true,
        }
    }
}

impl RAdamConfig {
    /// Creates config with learning rate.
    pub fn with_lr(lr: f32) -> Self {
        Self {
            lr,
            ..Default::default()
        }
    }

    /// Creates config with learning rate and weight decay.
    pub fn with_decay(lr: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            weight_decay,
            ..Default::default()
        }
    }

    /// Validates the hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`OptimError::InvalidHyperparameter`] if `lr < 0`,
    /// `epsilon < 0`, either beta is outside `[0, 1)`, or
    /// `weight_decay < 0`.
    pub fn validate(&self) -> OptimResult<()> {
        if self.lr < 0.0 {
            return Err(OptimError::invalid_hyperparameter("lr", self.lr));
        }
        if self.epsilon < 0.0 {
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

/// Checks both betas are in `[0, 1)`.
pub(crate) fn validate_betas(betas: (f32, f32)) -> OptimResult<()> {
    if !(0.0..1.0).contains(&betas.0) {
        return Err(OptimError::invalid_hyperparameter("beta1", betas.0));
    }
    if !(0.0..1.0).contains(&betas.1) {
        return Err(OptimError::invalid_hyperparameter("beta2", betas.1));
    }
    Ok(())
}

/// Updates both moment buffers in place and advances the step counter.
///
/// Shared by RAdam and Ranger; the second moment is updated first, matching
/// the reference ordering (the two updates are independent).
pub(crate) fn advance_moments(state: &mut ParamState, grad: &[f32], beta1: f32, beta2: f32) {
    for (v, &g) in state.exp_avg_sq.iter_mut().zip(grad) {
        *v = beta2 * *v + (1.0 - beta2) * g * g;
    }
    for (m, &g) in state.exp_avg.iter_mut().zip(grad) {
        *m = beta1 * *m + (1.0 - beta1) * g;
    }
    state.step += 1;
}

/// Applies `p -= weight_decay * lr * p` element-wise.
pub(crate) fn apply_weight_decay(param: &mut [f32], weight_decay: f32, lr: f32) {
    for p in param.iter_mut() {
        *p -= weight_decay * lr * *p;
    }
}

/// One RAdam update for a single parameter tensor.
///
/// Mutates `state` in place (step counter and moving averages advance even
/// when the sentinel suppresses the parameter write). `lr`, `betas`, `eps`
/// and `weight_decay` come from the parameter's group so per-group overrides
/// take effect.
#[allow(clippy::too_many_arguments)]
pub(crate) fn radam_update(
    param: &mut [f32],
    grad: &[f32],
    state: &mut ParamState,
    cache: &mut CoefficientCache,
    lr: f32,
    betas: (f32, f32),
    eps: f32,
    weight_decay: f32,
    degenerated_to_sgd: bool,
) {
    let (beta1, beta2) = betas;
    advance_moments(state, grad, beta1, beta2);

    let policy = RectifyPolicy {
        threshold: RADAM_N_SMA_THRESHOLD,
        exclusive: false,
        fallback: if degenerated_to_sgd {
            Fallback::Momentum
        } else {
            Fallback::Skip
        },
    };
    let (n_sma, step_size) = cache.coefficients(state.step, f64::from(beta1), f64::from(beta2), policy);

    if n_sma >= RADAM_N_SMA_THRESHOLD {
        if weight_decay != 0.0 {
            apply_weight_decay(param, weight_decay, lr);
        }
        let scale = lr * step_size as f32;
        for ((p, m), v) in param
            .iter_mut()
            .zip(&state.exp_avg)
            .zip(&state.exp_avg_sq)
        {
            *p -= scale * m / (v.sqrt() + eps);
        }
    } else if step_size > 0.0 {
        if weight_decay != 0.0 {
            apply_weight_decay(param, weight_decay, lr);
        }
        let scale = lr * step_size as f32;
        for (p, m) in param.iter_mut().zip(&state.exp_avg) {
            *p -= scale * m;
        }
    }
    // step_size == SKIP_STEP: no parameter change this step.
}
