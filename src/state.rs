//! Per-parameter optimizer state and its serializable form.
//!
//! Each trainable parameter gets one [`ParamState`] record, created lazily on
//! the first update that sees a gradient for it. The record holds the step
//! counter, both moment buffers, and (Ranger only) the Lookahead slow copy.
//!
//! [`StateDict`] is the checkpoint form: buffers are widened to `f64` on
//! save and promoted back to the parameter's native `f32` precision on load,
//! so a save/load round-trip is numerically exact.

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Moment buffers and step counter for one parameter tensor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParamState {
    /// Number of updates applied to this parameter so far.
    pub step: u64,

    /// First moment (exponential moving average of gradients).
    pub exp_avg: Vec<f32>,

    /// Second moment (exponential moving average of squared gradients).
    pub exp_avg_sq: Vec<f32>,

    /// Lookahead slow copy. Present only for Ranger; initialized to the
    /// parameter's value at first encounter.
    pub slow_buffer: Option<Vec<f32>>,
}

impl ParamState {
    /// Creates a fresh state with zeroed moment buffers of the given length.
    pub fn new(len: usize) -> Self {
        Self {
            step: 0,
            exp_avg: vec![0.0; len],
            exp_avg_sq: vec![0.0; len],
            slow_buffer: None,
        }
    }

    /// Creates a fresh state whose slow buffer starts as a copy of `param`.
    pub fn with_slow_buffer(param: &[f32]) -> Self {
        Self {
            step: 0,
            exp_avg: vec![0.0; param.len()],
            exp_avg_sq: vec![0.0; param.len()],
            slow_buffer: Some(param.to_vec()),
        }
    }

    /// Returns the length of the first buffer that disagrees with
    /// `param_len`, if any. Restored checkpoints can carry buffers sized for
    /// a different parameter; the update loops zip over the common prefix,
    /// so a mismatch has to be caught before the first update.
    pub fn buffer_len_mismatch(&self, param_len: usize) -> Option<usize> {
        if self.exp_avg.len() != param_len {
            return Some(self.exp_avg.len());
        }
        if self.exp_avg_sq.len() != param_len {
            return Some(self.exp_avg_sq.len());
        }
        match &self.slow_buffer {
            Some(slow) if slow.len() != param_len => Some(slow.len()),
            _ => None,
        }
    }
}

/// Mapping from parameter identity (index) to its [`ParamState`].
///
/// States are created lazily and persist for the optimizer's lifetime.
/// Each record is exclusively owned by the store; nothing aliases the
/// moment buffers.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    states: HashMap<usize, ParamState>,
}

impl StateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `param_index`, initializing it on first call.
    ///
    /// With `lookahead` set, the slow buffer is seeded from the parameter's
    /// current value. Parameters are `f32` throughout this crate, so the
    /// precision re-promotion the contract allows for is a no-op here; the
    /// widened checkpoint buffers are cast back on load instead.
    pub fn get_or_init(
        &mut self,
        param_index: usize,
        param: &[f32],
        lookahead: bool,
    ) -> &mut ParamState {
        self.states.entry(param_index).or_insert_with(|| {
            if lookahead {
                ParamState::with_slow_buffer(param)
            } else {
                ParamState::new(param.len())
            }
        })
    }

    /// Returns the state for `param_index`, if one exists.
    pub fn get(&self, param_index: usize) -> Option<&ParamState> {
        self.states.get(&param_index)
    }

    /// Inserts a state record, replacing any existing one.
    pub fn insert(&mut self, param_index: usize, state: ParamState) {
        self.states.insert(param_index, state);
    }

    /// Number of parameters with state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the store holds no state yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over `(param_index, state)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ParamState)> {
        self.states.iter().map(|(&k, v)| (k, v))
    }

    /// Drops all state.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Checkpoint form of one [`ParamState`], with buffers widened to `f64`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SavedState {
    /// Step counter at save time.
    pub step: u64,
    /// First moment, widened.
    pub exp_avg: Vec<f64>,
    /// Second moment, widened.
    pub exp_avg_sq: Vec<f64>,
    /// Lookahead slow copy, widened.
    pub slow_buffer: Option<Vec<f64>>,
}

impl From<&ParamState> for SavedState {
    fn from(state: &ParamState) -> Self {
        Self {
            step: state.step,
            exp_avg: widen(&state.exp_avg),
            exp_avg_sq: widen(&state.exp_avg_sq),
            slow_buffer: state.slow_buffer.as_deref().map(widen),
        }
    }
}

impl From<&SavedState> for ParamState {
    fn from(saved: &SavedState) -> Self {
        Self {
            step: saved.step,
            exp_avg: narrow(&saved.exp_avg),
            exp_avg_sq: narrow(&saved.exp_avg_sq),
            slow_buffer: saved.slow_buffer.as_deref().map(narrow),
        }
    }
}

/// Checkpoint form of one parameter group's hyperparameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SavedGroup {
    /// Current learning rate.
    pub lr: f32,
    /// Moment decay rates.
    pub betas: (f32, f32),
    /// Numerical floor.
    pub eps: f32,
    /// Weight decay coefficient.
    pub weight_decay: f32,
    /// Base learning rate recorded at construction.
    pub initial_lr: Option<f32>,
}

/// Checkpoint form of the algorithm selection and its own hyperparameters.
///
/// Group-level settings (lr, betas, eps, weight decay) live in
/// [`SavedGroup`]; this carries the knobs that belong to the algorithm
/// itself, so a restore resumes with the cadence and policy it was saved
/// with rather than whatever the fresh optimizer was built with.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SavedAlgorithm {
    /// Plain SGD.
    Sgd,
    /// Adam with decoupled decay.
    Adam,
    /// RAdam and its degeneration policy.
    RAdam {
        /// Momentum fallback below the rectification threshold.
        degenerated_to_sgd: bool,
    },
    /// Ranger and its Lookahead/rectification settings.
    Ranger {
        /// Lookahead slow-update rate.
        alpha: f32,
        /// Lookahead interval in steps.
        k: u64,
        /// Rectification-validity threshold.
        n_sma_threshold: f64,
    },
}

impl SavedAlgorithm {
    /// The algorithm name: `"sgd"`, `"adam"`, `"radam"` or `"ranger"`.
    pub fn name(&self) -> &'static str {
        match self {
            SavedAlgorithm::Sgd => "sgd",
            SavedAlgorithm::Adam => "adam",
            SavedAlgorithm::RAdam { .. } => "radam",
            SavedAlgorithm::Ranger { .. } => "ranger",
        }
    }
}

/// Serializable snapshot of an optimizer's internal state.
///
/// The step-coefficient cache is deliberately omitted: it is fully
/// recomputable from the step counters and betas.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateDict {
    /// Algorithm selection and its hyperparameters, validated on load.
    pub algorithm: SavedAlgorithm,
    /// Per-group hyperparameters.
    pub groups: Vec<SavedGroup>,
    /// Parameter index → saved state, in index order.
    pub states: BTreeMap<usize, SavedState>,
}

fn widen(buf: &[f32]) -> Vec<f64> {
    buf.iter().map(|&x| f64::from(x)).collect()
}

fn narrow(buf: &[f64]) -> Vec<f32> {
    buf.iter().map(|&x| x as f32).collect()
}
