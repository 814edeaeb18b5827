//! Plain stochastic gradient descent.
//!
//! The factory's `sgd` name maps here: `p -= lr * (g + weight_decay * p)`,
//! with the decay folded into the gradient as classic L2 regularization.
//! No momentum — the factory's `momentum` option is the Adam-family beta1
//! and is not consumed by this variant.

use crate::error::{OptimError, OptimResult};
use crate::state::ParamState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SGD hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SgdConfig {
    /// Learning rate.
    pub lr: f32,

    /// Weight decay (L2, folded into the gradient).
    pub weight_decay: f32,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            lr: 0.01,
            weight_decay: 0.0,
        }
    }
}

impl SgdConfig {
    /// Creates config with learning rate.
    pub fn with_lr(lr: f32) -> Self {
        Self {
            lr,
            ..Default::default()
        }
    }

    /// Validates the hyperparameters.
    pub fn validate(&self) -> OptimResult<()> {
        if self.lr < 0.0 {
            return Err(OptimError::invalid_hyperparameter("lr", self.lr));
        }
        if self.weight_decay < 0.0 {
            return Err(OptimError::invalid_hyperparameter(
                "weight_decay",
                self.weight_decay,
            ));
        }
        Ok(())
    }
}

/// One SGD update for a single parameter tensor.
///
/// The moment buffers stay untouched; only the step counter advances.
pub(crate) fn sgd_update(
    param: &mut [f32],
    grad: &[f32],
    state: &mut ParamState,
    lr: f32,
    weight_decay: f32,
) {
    state.step += 1;
    for (p, &g) in param.iter_mut().zip(grad) {
        let g = g + weight_decay * *p;
        *p -= lr * g;
    }
}
