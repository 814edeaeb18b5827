//! Warmup-aware plateau learning-rate scheduler.
//!
//! Two phases, driven by one [`WarmupPlateau::report`] call per epoch:
//!
//! 1. **Warmup** — for the first `warmup_epochs` epochs the learning rate
//!    ramps linearly: `lr = base_lr * epoch / warmup_epochs`. Warmup epochs
//!    always advance, whether or not an evaluation ran.
//! 2. **Plateau** — afterwards the schedule is evaluation-gated: a report
//!    without an evaluation result is a no-op (the epoch counter does not
//!    advance), and a reported metric feeds reduce-on-plateau bookkeeping
//!    that multiplies every group's rate by `factor` once the metric has
//!    failed to improve for more than `patience` consecutive evaluations.
//!
//! Base rates are taken from each group's `initial_lr`, so a checkpoint
//! restore followed by a fresh scheduler resumes the same ramp.

use crate::optimizer::Optimizer;

/// Whether a smaller or larger metric counts as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricMode {
    /// Lower is better (losses).
    Min,
    /// Higher is better (accuracies, scores).
    Max,
}

/// Linear-warmup + reduce-on-plateau scheduler.
///
/// Holds no reference to the optimizer; the caller passes it to each
/// [`report`](Self::report).
#[derive(Debug, Clone)]
pub struct WarmupPlateau {
    warmup_epochs: u64,
    last_epoch: u64,
    base_lrs: Vec<f32>,
    factor: f32,
    patience: u32,
    threshold: f32,
    cooldown: u32,
    min_lr: f32,
    mode: MetricMode,
    best: Option<f32>,
    num_bad_epochs: u32,
    cooldown_counter: u32,
}

impl WarmupPlateau {
    /// Creates a scheduler over the optimizer's current groups.
    ///
    /// Records each group's `initial_lr` (falling back to its current rate)
    /// as the warmup target. The first `report` call is epoch 1; with
    /// `warmup_epochs = 0` the ramp is skipped entirely.
    pub fn new(optimizer: &Optimizer, warmup_epochs: u64) -> Self {
        let base_lrs = optimizer
            .param_groups()
            .iter()
            .map(|g| g.initial_lr.unwrap_or(g.lr))
            .collect();
        Self {
            warmup_epochs,
            last_epoch: 0,
            base_lrs,
            factor: 0.1,
            patience: 10,
            threshold: 1e-4,
            cooldown: 0,
            min_lr: 0.0,
            mode: MetricMode::Min,
            best: None,
            num_bad_epochs: 0,
            cooldown_counter: 0,
        }
    }

    /// Sets the multiplicative reduction factor (default 0.1).
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Sets how many bad evaluations to tolerate before reducing (default 10).
    pub fn with_patience(mut self, patience: u32) -> Self {
        self.patience = patience;
        self
    }

    /// Sets the relative improvement threshold (default 1e-4).
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets how many evaluations to ignore after a reduction (default 0).
    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the learning-rate floor (default 0).
    pub fn with_min_lr(mut self, min_lr: f32) -> Self {
        self.min_lr = min_lr;
        self
    }

    /// Switches to higher-is-better metrics.
    pub fn with_mode_max(mut self) -> Self {
        self.mode = MetricMode::Max;
        self
    }

    /// Reports the end of an epoch.
    ///
    /// `metric` is the evaluation result (if any); `did_evaluate` says
    /// whether an evaluation ran this epoch. During warmup both are ignored.
    /// After warmup, a report with `did_evaluate == false` or no metric
    /// leaves everything untouched.
    pub fn report(&mut self, optimizer: &mut Optimizer, metric: Option<f32>, did_evaluate: bool) {
        let epoch = self.last_epoch + 1;
        if epoch <= self.warmup_epochs {
            let ramp = epoch as f32 / self.warmup_epochs as f32;
            for (group, &base) in optimizer.param_groups_mut().iter_mut().zip(&self.base_lrs) {
                group.lr = base * ramp;
            }
            self.last_epoch = epoch;
            return;
        }

        if !did_evaluate {
            return;
        }
        let metric = match metric {
            Some(m) => m,
            None => return,
        };
        self.last_epoch = epoch;

        if self.is_improvement(metric) {
            self.best = Some(metric);
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs > self.patience {
            self.reduce(optimizer);
            self.cooldown_counter = self.cooldown;
            self.num_bad_epochs = 0;
        }
    }

    fn is_improvement(&self, metric: f32) -> bool {
        let best = match self.best {
            Some(b) => b,
            None => return true,
        };
        match self.mode {
            MetricMode::Min => metric < best * (1.0 - self.threshold),
            MetricMode::Max => metric > best * (1.0 + self.threshold),
        }
    }

    fn reduce(&self, optimizer: &mut Optimizer) {
        for group in optimizer.param_groups_mut() {
            group.lr = (group.lr * self.factor).max(self.min_lr);
        }
    }

    /// Number of epochs reported so far (warmup + evaluated epochs).
    pub fn last_epoch(&self) -> u64 {
        self.last_epoch
    }

    /// Best metric seen so far, if any evaluation was reported.
    pub fn best_metric(&self) -> Option<f32> {
        self.best
    }

    /// Consecutive non-improving evaluations since the last improvement.
    pub fn num_bad_epochs(&self) -> u32 {
        self.num_bad_epochs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{create_optimizer, OptimizerOptions};

    fn ranger_with_lr(lr: f32) -> Optimizer {
        create_optimizer(
            "ranger",
            1,
            OptimizerOptions {
                lr,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_warmup_ramp_is_linear() {
        let mut opt = ranger_with_lr(0.5);
        let mut sched = WarmupPlateau::new(&opt, 5);
        for epoch in 1..=5u64 {
            sched.report(&mut opt, None, false);
            let expected = 0.5 * epoch as f32 / 5.0;
            assert!((opt.learning_rate() - expected).abs() < 1e-7);
        }
        assert!((opt.learning_rate() - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_warmup_ignores_metric() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 3);
        sched.report(&mut opt, Some(0.1), true);
        assert_eq!(sched.best_metric(), None);
        assert!((opt.learning_rate() - 1.0 / 3.0).abs() < 1e-7);
    }

    #[test]
    fn test_post_warmup_noop_without_evaluation() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 1);
        sched.report(&mut opt, None, false); // warmup epoch
        assert_eq!(sched.last_epoch(), 1);
        sched.report(&mut opt, None, false);
        sched.report(&mut opt, Some(0.5), false);
        assert_eq!(sched.last_epoch(), 1, "gated epochs must not advance");
        assert!((opt.learning_rate() - 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_plateau_reduces_after_patience() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 0).with_patience(2).with_factor(0.5);
        sched.report(&mut opt, Some(1.0), true); // best = 1.0
        // Three stagnant evaluations: bad = 1, 2, 3 > patience -> reduce.
        sched.report(&mut opt, Some(1.0), true);
        sched.report(&mut opt, Some(1.0), true);
        assert!((opt.learning_rate() - 1.0).abs() < 1e-7);
        sched.report(&mut opt, Some(1.0), true);
        assert!((opt.learning_rate() - 0.5).abs() < 1e-7);
        assert_eq!(sched.num_bad_epochs(), 0);
    }

    #[test]
    fn test_improvement_resets_bad_count() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 0).with_patience(1);
        sched.report(&mut opt, Some(1.0), true);
        sched.report(&mut opt, Some(1.0), true); // bad = 1
        sched.report(&mut opt, Some(0.5), true); // improvement
        assert_eq!(sched.num_bad_epochs(), 0);
        assert_eq!(sched.best_metric(), Some(0.5));
        assert!((opt.learning_rate() - 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_cooldown_suppresses_bad_epochs() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 0)
            .with_patience(0)
            .with_factor(0.5)
            .with_cooldown(2);
        sched.report(&mut opt, Some(1.0), true);
        sched.report(&mut opt, Some(1.0), true); // bad > 0 -> reduce, cooldown = 2
        assert!((opt.learning_rate() - 0.5).abs() < 1e-7);
        // Two stagnant reports during cooldown: bad count kept at zero.
        sched.report(&mut opt, Some(1.0), true);
        sched.report(&mut opt, Some(1.0), true);
        assert!((opt.learning_rate() - 0.5).abs() < 1e-7);
        // Cooldown over; the next stagnant report reduces again.
        sched.report(&mut opt, Some(1.0), true);
        assert!((opt.learning_rate() - 0.25).abs() < 1e-7);
    }

    #[test]
    fn test_min_lr_floor() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 0)
            .with_patience(0)
            .with_factor(0.1)
            .with_min_lr(0.05);
        sched.report(&mut opt, Some(1.0), true);
        for _ in 0..5 {
            sched.report(&mut opt, Some(1.0), true);
        }
        assert!((opt.learning_rate() - 0.05).abs() < 1e-7);
    }

    #[test]
    fn test_mode_max() {
        let mut opt = ranger_with_lr(1.0);
        let mut sched = WarmupPlateau::new(&opt, 0).with_patience(0).with_mode_max();
        sched.report(&mut opt, Some(0.5), true);
        sched.report(&mut opt, Some(0.9), true); // improvement, no reduction
        assert_eq!(sched.best_metric(), Some(0.9));
        assert!((opt.learning_rate() - 1.0).abs() < 1e-7);
    }
}
