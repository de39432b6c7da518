//! Early stopping on a monitored metric value.

/// Whether lower or higher metric values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Min,
    Max,
}

/// Stops training once the monitored value has not improved for `patience`
/// consecutive observations.
///
/// Metric values are NaN while nothing has been accumulated; such observations are
/// skipped entirely, they neither become the best value nor count against patience.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    mode: Mode,
    best_metric: Option<f64>,
    epochs_without_improvement: usize,
    stopped: bool,
}

impl EarlyStopping {
    pub fn new() -> Self {
        Self {
            patience: 3,
            min_delta: 0.0,
            mode: Mode::Min,
            best_metric: None,
            epochs_without_improvement: 0,
            stopped: false,
        }
    }

    pub fn patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn min_delta(mut self, delta: f64) -> Self {
        self.min_delta = delta;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    fn is_improvement(&self, current: f64, best: f64) -> bool {
        match self.mode {
            Mode::Min => current < best - self.min_delta,
            Mode::Max => current > best + self.min_delta,
        }
    }

    /// Records one observation. Returns `true` when it is a new best.
    pub fn observe(&mut self, current: f64) -> bool {
        if current.is_nan() {
            return false;
        }

        match self.best_metric {
            Some(best) if !self.is_improvement(current, best) => {
                self.epochs_without_improvement += 1;
                if self.epochs_without_improvement >= self.patience {
                    self.stopped = true;
                }
                false
            }
            _ => {
                self.best_metric = Some(current);
                self.epochs_without_improvement = 0;
                true
            }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best_metric
    }

    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    pub fn reset(&mut self) {
        self.best_metric = None;
        self.epochs_without_improvement = 0;
        self.stopped = false;
    }
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::new()
    }
}
