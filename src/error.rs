//! Unified error types for ranger-optim.
//!
//! This module provides [`OptimError`], a single error type covering
//! construction-time hyperparameter validation and per-step input errors.
//! It uses the `thiserror` crate for ergonomic error handling.
//!
//! # Example
//!
//! ```rust
//! use ranger_optim::{OptimError, RAdamConfig};
//!
//! let bad = RAdamConfig {
//!     beta2: 1.0, // must be < 1
//!     ..Default::default()
//! };
//! assert!(matches!(
//!     bad.validate(),
//!     Err(OptimError::InvalidHyperparameter { name: "beta2", .. })
//! ));
//! ```

use thiserror::Error;

/// Unified error type for optimizer operations.
///
/// All validation is local and synchronous. None of these errors are retried
/// by the crate; the training loop decides whether to abort or skip an
/// iteration. A failure partway through [`step`](crate::Optimizer::step)
/// leaves earlier parameters already updated — there is no rollback.
#[derive(Error, Debug)]
pub enum OptimError {
    /// A hyperparameter is outside its valid range.
    ///
    /// Raised eagerly at construction; values are never silently clamped.
    #[error("Invalid {name}: {value}")]
    InvalidHyperparameter {
        /// Name of the offending hyperparameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A gradient arrived in a sparse representation.
    ///
    /// The update algorithms only accept dense gradients. Fatal for that
    /// step call; the per-parameter state is left as the step found it.
    #[error("Sparse gradients are not supported (param {param_index})")]
    SparseGradient {
        /// Index of the parameter whose gradient was sparse.
        param_index: usize,
    },

    /// Unrecognized optimizer name passed to the factory.
    #[error("Unknown optimizer: {0}")]
    UnknownOptimizer(String),

    /// A parameter group already has `initial_lr` recorded.
    ///
    /// Guards against double-initialization when groups are passed through
    /// the construction path more than once.
    #[error("Parameter group {group_index} already has initial_lr recorded")]
    DuplicateInitialLr {
        /// Index of the offending group.
        group_index: usize,
    },

    /// Parameter and gradient lengths disagree.
    #[error("Shape mismatch at param {param_index}: param has {param_len} elements, grad has {grad_len}")]
    ShapeMismatch {
        /// Index of the parameter.
        param_index: usize,
        /// Element count of the parameter buffer.
        param_len: usize,
        /// Element count of the gradient buffer.
        grad_len: usize,
    },

    /// A parameter group references an index beyond the caller's slice.
    #[error("Param index {index} out of bounds (total params: {total})")]
    ParamIndexOutOfBounds {
        /// Requested parameter index.
        index: usize,
        /// Number of parameters the caller supplied.
        total: usize,
    },

    /// A state dict produced by a different algorithm was loaded.
    #[error("Cannot load {got} state into {expected} optimizer")]
    StateMismatch {
        /// Algorithm of the optimizer being loaded into.
        expected: String,
        /// Algorithm recorded in the state dict.
        got: String,
    },

    /// A parameter's state buffers disagree with the parameter's length.
    ///
    /// Only reachable through a restored checkpoint whose buffers were saved
    /// for a differently-shaped parameter.
    #[error("State buffers for param {param_index} have {state_len} elements, param has {param_len}")]
    StateShapeMismatch {
        /// Index of the parameter.
        param_index: usize,
        /// Element count of the parameter buffer.
        param_len: usize,
        /// Element count of the offending state buffer.
        state_len: usize,
    },
}

/// Result type alias for optimizer operations.
pub type OptimResult<T> = Result<T, OptimError>;

impl OptimError {
    /// Creates an invalid-hyperparameter error.
    pub fn invalid_hyperparameter(name: &'static str, value: impl Into<f64>) -> Self {
        OptimError::InvalidHyperparameter {
            name,
            value: value.into(),
        }
    }

    /// Creates a sparse-gradient error.
    pub fn sparse_gradient(param_index: usize) -> Self {
        OptimError::SparseGradient { param_index }
    }

    /// Creates an unknown-optimizer error.
    pub fn unknown_optimizer<S: Into<String>>(name: S) -> Self {
        OptimError::UnknownOptimizer(name.into())
    }

    /// Creates a shape-mismatch error.
    pub fn shape_mismatch(param_index: usize, param_len: usize, grad_len: usize) -> Self {
        OptimError::ShapeMismatch {
            param_index,
            param_len,
            grad_len,
        }
    }

    /// Creates a state-mismatch error.
    pub fn state_mismatch<S: Into<String>>(expected: S, got: S) -> Self {
        OptimError::StateMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Creates a state-shape-mismatch error.
    pub fn state_shape_mismatch(param_index: usize, param_len: usize, state_len: usize) -> Self {
        OptimError::StateShapeMismatch {
            param_index,
            param_len,
            state_len,
        }
    }
}
