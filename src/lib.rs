//! # ranger-optim - Rectified Adam and Ranger optimizers
//!
//! First-order optimizers for caller-owned `Vec<f32>` parameter buffers,
//! with a warmup-aware plateau learning-rate scheduler.
//!
//! ## What's inside
//! - RAdam: variance-rectified Adam with a degenerate-to-momentum fallback
//! - Ranger: RAdam core with integrated Lookahead slow weights
//! - Adam (decoupled decay) and plain SGD for baselines
//! - A 10-slot step-coefficient cache shared by the rectified optimizers
//! - `WarmupPlateau`: linear warmup, then evaluation-gated reduce-on-plateau
//!
//! ## Usage
//! ```rust
//! use ranger_optim::{create_optimizer, Grad, OptimizerOptions, WarmupPlateau};
//!
//! let mut params = vec![vec![0.5f32; 16]];
//! let mut opt = create_optimizer("ranger", params.len(), OptimizerOptions::default()).unwrap();
//! let mut sched = WarmupPlateau::new(&opt, 5);
//!
//! let grad = vec![0.1f32; 16];
//! let grads = vec![Some(Grad::Dense(&grad))];
//! opt.step(&mut params, &grads).unwrap();
//! sched.report(&mut opt, Some(0.3), true);
//! ```

pub mod adam;
pub mod cache;
pub mod error;
pub mod optimizer;
pub mod radam;
pub mod ranger;
pub mod scheduler;
pub mod sgd;
pub mod state;

// Re-exports
pub use adam::AdamConfig;
pub use cache::{CoefficientCache, StepCoefficients, SKIP_STEP, SLOTS};
pub use error::{OptimError, OptimResult};
pub use optimizer::{create_optimizer, Grad, Optimizer, OptimizerOptions, ParamGroup};
pub use radam::{RAdamConfig, RADAM_N_SMA_THRESHOLD};
pub use ranger::RangerConfig;
pub use scheduler::{MetricMode, WarmupPlateau};
pub use sgd::SgdConfig;
pub use state::{ParamState, SavedAlgorithm, StateDict, StateStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
