//! Adam with decoupled (AdamW-style) weight decay.
//!
//! Kept alongside RAdam/Ranger so the factory's `adam` name resolves to a
//! real optimizer. The bias-corrected step size is folded into a single
//! `alpha = lr * sqrt(1 - beta2^t) / (1 - beta1^t)` factor.

use crate::error::{OptimError, OptimResult};
use crate::radam::validate_betas;
use crate::state::ParamState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Adam hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdamConfig {
    /// Learning rate (alpha).
    pub lr: f32,

    /// First moment decay (beta1).
    pub beta1: f32,

    /// Second moment decay (beta2).
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,

    /// Weight decay (decoupled).
    pub weight_decay: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            lr: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
        }
    }
}

impl AdamConfig {
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

/// One Adam update for a single parameter tensor.
pub(crate) fn adam_update(
    param: &mut [f32],
    grad: &[f32],
    state: &mut ParamState,
    lr: f32,
    betas: (f32, f32),
    eps: f32,
    weight_decay: f32,
) {
    let (beta1, beta2) = betas;
    state.step += 1;

    // Bias correction factors
    let bc1 = 1.0 - beta1.powi(state.step as i32);
    let bc2 = 1.0 - beta2.powi(state.step as i32);
    let alpha = lr * bc2.sqrt() / bc1;

    let m = &mut state.exp_avg;
    let v = &mut state.exp_avg_sq;

    for i in 0..param.len() {
        let g = grad[i];

        m[i] = beta1 * m[i] + (1.0 - beta1) * g;
        v[i] = beta2 * v[i] + (1.0 - beta2) * g * g;

        let update = alpha * m[i] / (v[i].sqrt() + eps);

        if weight_decay > 0.0 {
            param[i] *= 1.0 - lr * weight_decay;
        }

        param[i] -= update;
    }
}
