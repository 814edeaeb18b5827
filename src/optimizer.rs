//! Optimizer front-end: parameter groups, algorithm dispatch, checkpointing.
//!
//! Parameters live with the caller as `Vec<f32>` buffers addressed by index;
//! the optimizer owns only hyperparameters and per-parameter state. One
//! [`Optimizer::step`] call per training iteration walks every group,
//! fetches or initializes each parameter's state, and applies the selected
//! algorithm's update.
//!
//! Algorithms are selected by a tagged enum rather than trait objects: the
//! set is closed and each variant carries exactly the extra state it needs
//! (RAdam keeps one coefficient cache per group so per-group betas stay
//! correct; Ranger keeps a single optimizer-wide cache).
//!
//! # Example
//!
//! ```rust
//! use ranger_optim::{create_optimizer, Grad, OptimizerOptions};
//!
//! let mut params = vec![vec![1.0f32; 8], vec![0.5f32; 4]];
//! let mut opt = create_optimizer("ranger", params.len(), OptimizerOptions::default()).unwrap();
//!
//! let g0 = vec![0.1f32; 8];
//! let g1 = vec![-0.1f32; 4];
//! let grads = vec![Some(Grad::Dense(&g0)), Some(Grad::Dense(&g1))];
//! opt.step(&mut params, &grads).unwrap();
//! ```

use crate::adam::{adam_update, AdamConfig};
use crate::cache::CoefficientCache;
use crate::error::{OptimError, OptimResult};
use crate::radam::{radam_update, validate_betas, RAdamConfig};
use crate::ranger::{ranger_update, RangerConfig};
use crate::sgd::{sgd_update, SgdConfig};
use crate::state::{ParamState, SavedAlgorithm, SavedGroup, SavedState, StateDict, StateStore};

/// A gradient for one parameter, as supplied by the caller per step.
#[derive(Debug, Clone, Copy)]
pub enum Grad<'a> {
    /// Dense gradient, same element count as the parameter.
    Dense(&'a [f32]),
    /// Sparse (index/value) gradient. Not supported by any algorithm here;
    /// passing one fails the step with [`OptimError::SparseGradient`].
    Sparse {
        /// Element indices.
        indices: &'a [usize],
        /// Values at those indices.
        values: &'a [f32],
    },
}

/// One parameter group: a set of parameter indices sharing hyperparameters.
///
/// Groups let parts of a model train with their own learning rate, betas or
/// weight decay. Betas feed the step-coefficient computation, so a group
/// with overridden betas sees its own rectification schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGroup {
    /// Indices into the caller's parameter list.
    pub params: Vec<usize>,
    /// Learning rate (mutated by the scheduler).
    pub lr: f32,
    /// Moment decay rates.
    pub betas: (f32, f32),
    /// Numerical floor.
    pub eps: f32,
    /// Weight decay coefficient.
    pub weight_decay: f32,
    /// Base learning rate, recorded once at construction.
    pub initial_lr: Option<f32>,
}

impl ParamGroup {
    /// Creates a group with explicit hyperparameters.
    pub fn new(params: Vec<usize>, lr: f32, betas: (f32, f32), eps: f32, weight_decay: f32) -> Self {
        Self {
            params,
            lr,
            betas,
            eps,
            weight_decay,
            initial_lr: None,
        }
    }

    /// Overrides the betas for this group.
    pub fn with_betas(mut self, betas: (f32, f32)) -> Self {
        self.betas = betas;
        self
    }

    /// Overrides the learning rate for this group.
    pub fn with_lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }

    fn validate(&self) -> OptimResult<()> {
        if self.lr < 0.0 {
            return Err(OptimError::invalid_hyperparameter("lr", self.lr));
        }
        if self.eps < 0.0 {
            return Err(OptimError::invalid_hyperparameter("epsilon", self.eps));
        }
        validate_betas(self.betas)?;
        if self.weight_decay < 0.0 {
            return Err(OptimError::invalid_hyperparameter(
                "weight_decay",
                self.weight_decay,
            ));
        }
        Ok(())
    }
}

/// The update algorithm and the extra state it carries.
#[derive(Debug, Clone)]
enum Algorithm {
    Sgd,
    Adam,
    RAdam {
        degenerated_to_sgd: bool,
        /// One cache per group: coefficients depend on the group's betas.
        caches: Vec<CoefficientCache>,
    },
    Ranger {
        alpha: f32,
        k: u64,
        n_sma_threshold: f64,
        /// Single optimizer-wide cache. Slot validity is checked by step
        /// only, so groups with different betas at the same step would read
        /// each other's coefficients; groups must share betas.
        cache: CoefficientCache,
    },
}

impl Algorithm {
    fn name(&self) -> &'static str {
        match self {
            Algorithm::Sgd => "sgd",
            Algorithm::Adam => "adam",
            Algorithm::RAdam { .. } => "radam",
            Algorithm::Ranger { .. } => "ranger",
        }
    }

    fn uses_lookahead(&self) -> bool {
        matches!(self, Algorithm::Ranger { .. })
    }
}

/// A gradient-descent optimizer over caller-owned parameter buffers.
#[derive(Debug)]
pub struct Optimizer {
    groups: Vec<ParamGroup>,
    states: StateStore,
    algorithm: Algorithm,
}

impl Optimizer {
    /// Creates a plain SGD optimizer over parameters `0..n_params`.
    pub fn sgd(n_params: usize, config: SgdConfig) -> OptimResult<Self> {
        config.validate()?;
        let group = ParamGroup::new((0..n_params).collect(), config.lr, (0.0, 0.0), 0.0, config.weight_decay);
        Self::build(vec![group], Algorithm::Sgd)
    }

    /// Creates an Adam optimizer over parameters `0..n_params`.
    pub fn adam(n_params: usize, config: AdamConfig) -> OptimResult<Self> {
        config.validate()?;
        let group = ParamGroup::new(
            (0..n_params).collect(),
            config.lr,
            (config.beta1, config.beta2),
            config.epsilon,
            config.weight_decay,
        );
        Self::build(vec![group], Algorithm::Adam)
    }

    /// Creates a RAdam optimizer over parameters `0..n_params`.
    pub fn radam(n_params: usize, config: RAdamConfig) -> OptimResult<Self> {
        let group = ParamGroup::new(
            (0..n_params).collect(),
            config.lr,
            (config.beta1, config.beta2),
            config.epsilon,
            config.weight_decay,
        );
        Self::radam_grouped(vec![group], config)
    }

    /// Creates a RAdam optimizer with caller-built parameter groups.
    ///
    /// Group fields (betas in particular) override the config defaults for
    /// the parameters they cover.
    pub fn radam_grouped(groups: Vec<ParamGroup>, config: RAdamConfig) -> OptimResult<Self> {
        config.validate()?;
        let caches = vec![CoefficientCache::new(); groups.len()];
        Self::build(
            groups,
            Algorithm::RAdam {
                degenerated_to_sgd: config.degenerated_to_sgd,
                caches,
            },
        )
    }

    /// Creates a Ranger optimizer over parameters `0..n_params`.
    pub fn ranger(n_params: usize, config: RangerConfig) -> OptimResult<Self> {
        let group = ParamGroup::new(
            (0..n_params).collect(),
            config.lr,
            (config.beta1, config.beta2),
            config.epsilon,
            config.weight_decay,
        );
        Self::ranger_grouped(vec![group], config)
    }

    /// Creates a Ranger optimizer with caller-built parameter groups.
    pub fn ranger_grouped(groups: Vec<ParamGroup>, config: RangerConfig) -> OptimResult<Self> {
        config.validate()?;
        Self::build(
            groups,
            Algorithm::Ranger {
                alpha: config.alpha,
                k: config.k,
                n_sma_threshold: config.n_sma_threshold,
                cache: CoefficientCache::new(),
            },
        )
    }

    /// Validates groups and records each group's `initial_lr`.
    fn build(mut groups: Vec<ParamGroup>, algorithm: Algorithm) -> OptimResult<Self> {
        for (group_index, group) in groups.iter_mut().enumerate() {
            group.validate()?;
            if group.initial_lr.is_some() {
                return Err(OptimError::DuplicateInitialLr { group_index });
            }
            group.initial_lr = Some(group.lr);
        }
        Ok(Self {
            groups,
            states: StateStore::new(),
            algorithm,
        })
    }

    /// Performs one optimization step.
    ///
    /// `grads[i]` is the gradient for `params[i]`; `None` skips that
    /// parameter. Must be called exactly once per training iteration, after
    /// all gradients are computed.
    ///
    /// # Errors
    ///
    /// Fails on sparse gradients, param/grad length mismatch, or a group
    /// referencing an index outside `params`. On error, parameters already
    /// visited in this call keep their updates; there is no rollback.
    pub fn step(&mut self, params: &mut [Vec<f32>], grads: &[Option<Grad<'_>>]) -> OptimResult<()> {
        let states = &mut self.states;
        let algorithm = &mut self.algorithm;
        let lookahead = algorithm.uses_lookahead();

        for (group_index, group) in self.groups.iter().enumerate() {
            for &param_index in &group.params {
                if param_index >= params.len() {
                    return Err(OptimError::ParamIndexOutOfBounds {
                        index: param_index,
                        total: params.len(),
                    });
                }
                let grad = match grads.get(param_index).and_then(Option::as_ref) {
                    Some(Grad::Dense(g)) => *g,
                    Some(Grad::Sparse { .. }) => {
                        return Err(OptimError::sparse_gradient(param_index))
                    }
                    None => continue,
                };
                let param = &mut params[param_index];
                if grad.len() != param.len() {
                    return Err(OptimError::shape_mismatch(
                        param_index,
                        param.len(),
                        grad.len(),
                    ));
                }

                let state = states.get_or_init(param_index, param, lookahead);
                if let Some(state_len) = state.buffer_len_mismatch(param.len()) {
                    return Err(OptimError::state_shape_mismatch(
                        param_index,
                        param.len(),
                        state_len,
                    ));
                }
                match algorithm {
                    Algorithm::Sgd => {
                        sgd_update(param, grad, state, group.lr, group.weight_decay);
                    }
                    Algorithm::Adam => {
                        adam_update(
                            param,
                            grad,
                            state,
                            group.lr,
                            group.betas,
                            group.eps,
                            group.weight_decay,
                        );
                    }
                    Algorithm::RAdam {
                        degenerated_to_sgd,
                        caches,
                    } => {
                        radam_update(
                            param,
                            grad,
                            state,
                            &mut caches[group_index],
                            group.lr,
                            group.betas,
                            group.eps,
                            group.weight_decay,
                            *degenerated_to_sgd,
                        );
                    }
                    Algorithm::Ranger {
                        alpha,
                        k,
                        n_sma_threshold,
                        cache,
                    } => {
                        ranger_update(
                            param,
                            grad,
                            state,
                            cache,
                            group.lr,
                            group.betas,
                            group.eps,
                            group.weight_decay,
                            *alpha,
                            *k,
                            *n_sma_threshold,
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// The algorithm name: `"sgd"`, `"adam"`, `"radam"` or `"ranger"`.
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Read access to the parameter groups.
    pub fn param_groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// Mutable access to the parameter groups (used by the scheduler).
    pub fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        &mut self.groups
    }

    /// Current learning rate of the first group.
    pub fn learning_rate(&self) -> f32 {
        self.groups.first().map(|g| g.lr).unwrap_or(0.0)
    }

    /// Sets the learning rate on every group.
    pub fn set_learning_rate(&mut self, lr: f32) {
        for group in &mut self.groups {
            group.lr = lr;
        }
    }

    /// Read access to a parameter's state, if one exists yet.
    pub fn param_state(&self, param_index: usize) -> Option<&ParamState> {
        self.states.get(param_index)
    }

    /// Exports a serializable snapshot of hyperparameters and per-parameter
    /// state. The coefficient cache is omitted; it is recomputable.
    pub fn state_dict(&self) -> StateDict {
        let algorithm = match &self.algorithm {
            Algorithm::Sgd => SavedAlgorithm::Sgd,
            Algorithm::Adam => SavedAlgorithm::Adam,
            Algorithm::RAdam {
                degenerated_to_sgd, ..
            } => SavedAlgorithm::RAdam {
                degenerated_to_sgd: *degenerated_to_sgd,
            },
            Algorithm::Ranger {
                alpha,
                k,
                n_sma_threshold,
                ..
            } => SavedAlgorithm::Ranger {
                alpha: *alpha,
                k: *k,
                n_sma_threshold: *n_sma_threshold,
            },
        };
        StateDict {
            algorithm,
            groups: self
                .groups
                .iter()
                .map(|g| SavedGroup {
                    lr: g.lr,
                    betas: g.betas,
                    eps: g.eps,
                    weight_decay: g.weight_decay,
                    initial_lr: g.initial_lr,
                })
                .collect(),
            states: self
                .states
                .iter()
                .map(|(idx, state)| (idx, SavedState::from(state)))
                .collect(),
        }
    }

    /// Restores hyperparameters and per-parameter state from a snapshot.
    ///
    /// Algorithm-level settings (Ranger's `alpha`/`k`/`n_sma_threshold`,
    /// RAdam's degeneration policy) are restored from the snapshot, so the
    /// optimizer resumes with the saved Lookahead cadence even if it was
    /// constructed with different values. Buffers saved in widened precision
    /// are promoted back to the parameters' native `f32` precision.
    ///
    /// Buffer lengths cannot be checked here (parameters are caller-owned);
    /// a mismatch surfaces as [`OptimError::StateShapeMismatch`] on the next
    /// [`step`](Self::step).
    ///
    /// # Errors
    ///
    /// Returns [`OptimError::StateMismatch`] if the snapshot was produced by
    /// a different algorithm.
    pub fn load_state_dict(&mut self, dict: &StateDict) -> OptimResult<()> {
        if dict.algorithm.name() != self.algorithm.name() {
            return Err(OptimError::state_mismatch(
                self.algorithm.name().to_string(),
                dict.algorithm.name().to_string(),
            ));
        }
        match (&mut self.algorithm, &dict.algorithm) {
            (
                Algorithm::RAdam {
                    degenerated_to_sgd, ..
                },
                SavedAlgorithm::RAdam {
                    degenerated_to_sgd: saved,
                },
            ) => *degenerated_to_sgd = *saved,
            (
                Algorithm::Ranger {
                    alpha,
                    k,
                    n_sma_threshold,
                    ..
                },
                SavedAlgorithm::Ranger {
                    alpha: saved_alpha,
                    k: saved_k,
                    n_sma_threshold: saved_threshold,
                },
            ) => {
                *alpha = *saved_alpha;
                *k = *saved_k;
                *n_sma_threshold = *saved_threshold;
            }
            _ => {}
        }
        for (group, saved) in self.groups.iter_mut().zip(&dict.groups) {
            group.lr = saved.lr;
            group.betas = saved.betas;
            group.eps = saved.eps;
            group.weight_decay = saved.weight_decay;
            group.initial_lr = saved.initial_lr;
        }
        self.states.clear();
        for (&idx, saved) in &dict.states {
            self.states.insert(idx, ParamState::from(saved));
        }
        Ok(())
    }
}

/// Options consumed by [`create_optimizer`].
///
/// `momentum` doubles as beta1 for the Adam family, mirroring the usual
/// training-config layout where one momentum knob feeds every optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerOptions {
    /// Learning rate.
    pub lr: f32,
    /// Weight decay coefficient.
    pub weight_decay: f32,
    /// beta1 for radam/ranger; unused by plain sgd.
    pub momentum: f32,
    /// beta2 for radam/ranger.
    pub beta2: f32,
    /// Numerical floor for radam/ranger.
    pub eps: f32,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            weight_decay: 0.0,
            momentum: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

/// Builds an optimizer by name over parameters `0..n_params`.
///
/// Recognized names: `"adam"`, `"sgd"`, `"radam"`, `"ranger"`. Adam and SGD
/// take only `lr` and `weight_decay` from `opts`; RAdam and Ranger also take
/// `(momentum, beta2)` as betas and `eps`.
///
/// # Errors
///
/// Returns [`OptimError::UnknownOptimizer`] for any other name, or a
/// validation error from the selected config.
pub fn create_optimizer(
    name: &str,
    n_params: usize,
    opts: OptimizerOptions,
) -> OptimResult<Optimizer> {
    match name {
        "adam" => Optimizer::adam(
            n_params,
            AdamConfig {
                lr: opts.lr,
                weight_decay: opts.weight_decay,
                ..Default::default()
            },
        ),
        "sgd" => Optimizer::sgd(
            n_params,
            SgdConfig {
                lr: opts.lr,
                weight_decay: opts.weight_decay,
            },
        ),
        "radam" => Optimizer::radam(
            n_params,
            RAdamConfig {
                lr: opts.lr,
                beta1: opts.momentum,
                beta2: opts.beta2,
                epsilon: opts.eps,
                weight_decay: opts.weight_decay,
                ..Default::default()
            },
        ),
        "ranger" => Optimizer::ranger(
            n_params,
            RangerConfig {
                lr: opts.lr,
                beta1: opts.momentum,
                beta2: opts.beta2,
                epsilon: opts.eps,
                weight_decay: opts.weight_decay,
                ..Default::default()
            },
        ),
        other => Err(OptimError::unknown_optimizer(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_rejected() {
        let err = create_optimizer("adagrad", 1, OptimizerOptions::default()).unwrap_err();
        assert!(matches!(err, OptimError::UnknownOptimizer(_)));
    }

    #[test]
    fn test_initial_lr_recorded_once() {
        let opt = create_optimizer("radam", 2, OptimizerOptions::default()).unwrap();
        assert_eq!(opt.param_groups()[0].initial_lr, Some(1e-3));

        // A group arriving with initial_lr already set is rejected.
        let mut group = ParamGroup::new(vec![0, 1], 0.01, (0.9, 0.999), 1e-8, 0.0);
        group.initial_lr = Some(0.01);
        let err = Optimizer::radam_grouped(vec![group], RAdamConfig::default()).unwrap_err();
        assert!(matches!(err, OptimError::DuplicateInitialLr { group_index: 0 }));
    }

    #[test]
    fn test_sparse_gradient_rejected() {
        let mut opt = create_optimizer("radam", 1, OptimizerOptions::default()).unwrap();
        let mut params = vec![vec![1.0f32; 4]];
        let indices = [0usize];
        let values = [1.0f32];
        let grads = vec![Some(Grad::Sparse {
            indices: &indices,
            values: &values,
        })];
        let err = opt.step(&mut params, &grads).unwrap_err();
        assert!(matches!(err, OptimError::SparseGradient { param_index: 0 }));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut opt = create_optimizer("adam", 1, OptimizerOptions::default()).unwrap();
        let mut params = vec![vec![1.0f32; 4]];
        let g = vec![1.0f32; 3];
        let grads = vec![Some(Grad::Dense(&g))];
        let err = opt.step(&mut params, &grads).unwrap_err();
        assert!(matches!(err, OptimError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_missing_grad_skips_param() {
        let mut opt = create_optimizer("ranger", 2, OptimizerOptions::default()).unwrap();
        let mut params = vec![vec![1.0f32; 2], vec![1.0f32; 2]];
        let g = vec![1.0f32; 2];
        let grads = vec![Some(Grad::Dense(&g)), None];
        opt.step(&mut params, &grads).unwrap();
        assert_ne!(params[0], vec![1.0f32; 2]);
        assert_eq!(params[1], vec![1.0f32; 2]);
        assert!(opt.param_state(1).is_none(), "skipped param gets no state");
    }

    #[test]
    fn test_group_index_out_of_bounds() {
        let mut opt = create_optimizer("sgd", 3, OptimizerOptions::default()).unwrap();
        let mut params = vec![vec![1.0f32; 2]]; // fewer params than declared
        let g = vec![1.0f32; 2];
        let grads = vec![Some(Grad::Dense(&g))];
        let err = opt.step(&mut params, &grads);
        assert!(matches!(
            err,
            Err(OptimError::ParamIndexOutOfBounds { index: 1, total: 1 })
        ));
    }

    #[test]
    fn test_per_group_betas_override() {
        let groups = vec![
            ParamGroup::new(vec![0], 0.01, (0.9, 0.999), 1e-8, 0.0),
            ParamGroup::new(vec![1], 0.01, (0.9, 0.999), 1e-8, 0.0).with_betas((0.5, 0.99)),
        ];
        let mut opt = Optimizer::radam_grouped(groups, RAdamConfig::default()).unwrap();
        let mut params = vec![vec![1.0f32], vec![1.0f32]];
        let g = vec![1.0f32];
        let grads = vec![Some(Grad::Dense(&g)), Some(Grad::Dense(&g))];
        // With beta2 = 0.99 the rectified branch engages sooner, so the two
        // groups must diverge once past the first few steps.
        for _ in 0..8 {
            opt.step(&mut params, &grads).unwrap();
        }
        assert_ne!(params[0][0], params[1][0]);
    }

    #[test]
    fn test_state_dict_algorithm_guard() {
        let radam = create_optimizer("radam", 1, OptimizerOptions::default()).unwrap();
        let mut ranger = create_optimizer("ranger", 1, OptimizerOptions::default()).unwrap();
        let err = ranger.load_state_dict(&radam.state_dict()).unwrap_err();
        assert!(matches!(err, OptimError::StateMismatch { .. }));
    }

    #[test]
    fn test_load_restores_lookahead_cadence() {
        // Saved with k = 3; the restoring optimizer was built with the
        // default k = 6 and must resume on the saved cadence.
        let saved_config = RangerConfig {
            k: 3,
            alpha: 0.25,
            ..Default::default()
        };
        let mut source = Optimizer::ranger(1, saved_config).unwrap();
        let mut params = vec![vec![1.0f32; 2]];
        let grad = vec![1.0f32; 2];
        let grads = vec![Some(Grad::Dense(&grad))];
        opt_steps(&mut source, &mut params, &grads, 1);

        let dict = source.state_dict();
        assert!(matches!(
            dict.algorithm,
            SavedAlgorithm::Ranger { k: 3, .. }
        ));

        let mut restored = Optimizer::ranger(1, RangerConfig::default()).unwrap();
        restored.load_state_dict(&dict).unwrap();

        // Steps 2 and 3 of the restored run; the Lookahead pull lands at
        // step 3, not at the fresh optimizer's step 6.
        opt_steps(&mut restored, &mut params, &grads, 1);
        let state = restored.param_state(0).unwrap();
        assert_ne!(&params[0], state.slow_buffer.as_ref().unwrap());
        opt_steps(&mut restored, &mut params, &grads, 1);
        let state = restored.param_state(0).unwrap();
        assert_eq!(&params[0], state.slow_buffer.as_ref().unwrap());
    }

    #[test]
    fn test_load_restores_degeneration_policy() {
        let mut source = Optimizer::radam(
            1,
            RAdamConfig {
                degenerated_to_sgd: false,
                ..Default::default()
            },
        )
        .unwrap();
        let mut params = vec![vec![1.0f32]];
        let grad = vec![1.0f32];
        let grads = vec![Some(Grad::Dense(&grad))];
        opt_steps(&mut source, &mut params, &grads, 1);

        let mut restored = Optimizer::radam(1, RAdamConfig::default()).unwrap();
        restored.load_state_dict(&source.state_dict()).unwrap();

        // Step 2 is below the rectification threshold; with the restored
        // skip policy the parameter must not move.
        let before = params[0].clone();
        opt_steps(&mut restored, &mut params, &grads, 1);
        assert_eq!(params[0], before);
    }

    #[test]
    fn test_undersized_restored_state_rejected() {
        // A checkpoint whose buffers were saved for a 2-element parameter,
        // loaded into an optimizer over a 4-element parameter.
        let saved = SavedState {
            step: 6,
            exp_avg: vec![0.1; 2],
            exp_avg_sq: vec![0.01; 2],
            slow_buffer: None,
        };
        let dict = StateDict {
            algorithm: SavedAlgorithm::RAdam {
                degenerated_to_sgd: true,
            },
            groups: vec![SavedGroup {
                lr: 1e-3,
                betas: (0.9, 0.999),
                eps: 1e-8,
                weight_decay: 0.0,
                initial_lr: Some(1e-3),
            }],
            states: std::iter::once((0, saved)).collect(),
        };

        let mut opt = create_optimizer("radam", 1, OptimizerOptions::default()).unwrap();
        opt.load_state_dict(&dict).unwrap();

        let mut params = vec![vec![1.0f32; 4]];
        let grad = vec![0.5f32; 4];
        let grads = vec![Some(Grad::Dense(&grad))];
        let err = opt.step(&mut params, &grads).unwrap_err();
        assert!(matches!(
            err,
            OptimError::StateShapeMismatch {
                param_index: 0,
                param_len: 4,
                state_len: 2,
            }
        ));
        assert_eq!(params[0], vec![1.0f32; 4], "no partial update");
    }

    fn opt_steps(
        opt: &mut Optimizer,
        params: &mut [Vec<f32>],
        grads: &[Option<Grad<'_>>],
        n: usize,
    ) {
        for _ in 0..n {
            opt.step(params, grads).unwrap();
        }
    }
}
