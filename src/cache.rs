//! Step-coefficient cache for variance rectification.
//!
//! The rectification term `n_sma` and the resulting step size depend only on
//! the step count and the betas, not on any parameter's values. When many
//! parameters share a step counter, recomputing them per parameter is
//! wasted work, so they are memoized in a rolling buffer of [`SLOTS`]
//! entries keyed by `step % SLOTS`. A slot is valid only when its stored
//! step equals the requested step; a stale slot is recomputed and
//! overwritten, never returned.
//!
//! The scalar math here runs in `f64` so branch selection at the validity
//! threshold is deterministic regardless of how many steps have elapsed.

/// Number of slots in the rolling buffer.
pub const SLOTS: usize = 10;

/// Sentinel step size meaning "skip the parameter update this step".
///
/// Produced when the variance estimate is unreliable and degeneration to
/// momentum is disabled. Moments and the step counter still advance.
pub const SKIP_STEP: f64 = -1.0;

/// Memoized coefficients for one step value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCoefficients {
    /// The step these coefficients were computed for.
    pub step: u64,
    /// Rectification term (effective sample size of the second moment).
    pub n_sma: f64,
    /// Bias-corrected step size, or [`SKIP_STEP`].
    pub step_size: f64,
}

/// What to do when the variance estimate is not yet reliable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Use a plain bias-corrected momentum step.
    Momentum,
    /// Emit [`SKIP_STEP`]; the parameter is left untouched this step.
    Skip,
}

/// Branch-selection policy for the rectified step.
///
/// RAdam compares `n_sma >= 5` (inclusive, fixed threshold) while Ranger
/// compares `n_sma > n_sma_threshold` (exclusive, configurable). The two
/// comparators differ by one unit at the boundary and are kept distinct on
/// purpose.
#[derive(Debug, Clone, Copy)]
pub struct RectifyPolicy {
    /// Validity threshold for `n_sma`.
    pub threshold: f64,
    /// `true` → strict `>` comparison; `false` → `>=`.
    pub exclusive: bool,
    /// Behavior below the threshold.
    pub fallback: Fallback,
}

impl RectifyPolicy {
    /// Whether the rectified branch applies for this `n_sma`.
    #[inline]
    pub fn rectified(&self, n_sma: f64) -> bool {
        if self.exclusive {
            n_sma > self.threshold
        } else {
            n_sma >= self.threshold
        }
    }
}

/// Rolling memo of [`StepCoefficients`] keyed by `step % SLOTS`.
#[derive(Debug, Clone, Default)]
pub struct CoefficientCache {
    slots: [Option<StepCoefficients>; SLOTS],
}

impl CoefficientCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(n_sma, step_size)` for `step`, computing and caching on a
    /// miss or a stale slot.
    pub fn coefficients(
        &mut self,
        step: u64,
        beta1: f64,
        beta2: f64,
        policy: RectifyPolicy,
    ) -> (f64, f64) {
        let slot = (step % SLOTS as u64) as usize;
        if let Some(cached) = self.slots[slot] {
            if cached.step == step {
                return (cached.n_sma, cached.step_size);
            }
        }
        let (n_sma, step_size) = compute_coefficients(step, beta1, beta2, policy);
        self.slots[slot] = Some(StepCoefficients {
            step,
            n_sma,
            step_size,
        });
        (n_sma, step_size)
    }

    /// Drops all cached entries.
    pub fn clear(&mut self) {
        self.slots = [None; SLOTS];
    }
}

/// Uncached coefficient computation for step `t >= 1`.
pub fn compute_coefficients(
    step: u64,
    beta1: f64,
    beta2: f64,
    policy: RectifyPolicy,
) -> (f64, f64) {
    let t = step as i32;
    let beta2_t = beta2.powi(t);
    let n_sma_max = 2.0 / (1.0 - beta2) - 1.0;
    let n_sma = n_sma_max - 2.0 * step as f64 * beta2_t / (1.0 - beta2_t);
    let bias1 = 1.0 - beta1.powi(t);

    let step_size = if policy.rectified(n_sma) {
        ((1.0 - beta2_t) * (n_sma - 4.0) / (n_sma_max - 4.0) * (n_sma - 2.0) / n_sma
            * n_sma_max
            / (n_sma_max - 2.0))
            .sqrt()
            / bias1
    } else if policy.fallback == Fallback::Momentum {
        1.0 / bias1
    } else {
        SKIP_STEP
    };

    (n_sma, step_size)
}
