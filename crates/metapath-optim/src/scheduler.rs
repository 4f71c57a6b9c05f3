//! Learning rate schedules for optimizers.
//!
//! These modify the learning rate over training steps.

/// Cosine annealing from `initial_lr` down to `min_lr` over `t_max` steps.
///
/// LR = η_min + 0.5 * (η_max - η_min) * (1 + cos(π * step / T_max))
///
/// Steps past `t_max` stay at `min_lr`.
#[derive(Debug, Clone)]
pub struct CosineAnnealingLR {
    pub initial_lr: f64,
    pub min_lr: f64,
    pub t_max: usize,
    pub current_step: usize,
}

impl CosineAnnealingLR {
    pub fn new(initial_lr: f64, t_max: usize) -> Self {
        CosineAnnealingLR { initial_lr, min_lr: 0.0, t_max, current_step: 0 }
    }

    pub fn with_min_lr(mut self, min_lr: f64) -> Self {
        self.min_lr = min_lr;
        self
    }

    pub fn step(&mut self) { self.current_step += 1; }

    pub fn get_lr(&self) -> f64 {
        if self.t_max == 0 {
            return self.initial_lr;
        }
        let progress = (self.current_step as f64 / self.t_max as f64).min(1.0);
        self.min_lr + 0.5 * (self.initial_lr - self.min_lr) * (1.0 + (std::f64::consts::PI * progress).cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_annealing() {
        let mut sched = CosineAnnealingLR::new(0.1, 100);
        assert!((sched.get_lr() - 0.1).abs() < 1e-10);
        for _ in 0..50 { sched.step(); }
        // At halfway, should be ~0.05
        assert!(sched.get_lr() < 0.06 && sched.get_lr() > 0.04);
        for _ in 0..50 { sched.step(); }
        // At end, should be ~0.0
        assert!(sched.get_lr() < 0.01);
    }

    #[test]
    fn test_monotone_over_whole_run() {
        let mut sched = CosineAnnealingLR::new(0.02, 30).with_min_lr(0.001);
        let mut last = sched.get_lr();
        for _ in 0..40 {
            sched.step();
            let lr = sched.get_lr();
            assert!(lr <= last + 1e-15);
            assert!(lr >= 0.001 - 1e-15);
            last = lr;
        }
        assert!((last - 0.001).abs() < 1e-12);
    }
}
