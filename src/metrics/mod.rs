//! Metrics for tracking training progress.
//!
//! Every metric is a running average over the batches seen since the last reset,
//! kept by an [`Accumulator`]. Losses are metrics too (see [`crate::nn::losses::Loss`]).

pub mod accuracy;
pub mod early_stopping;

use crate::backend::Float;
use crate::error::Result;
use crate::tensor::{Tensor, TensorList};

pub use accuracy::Accuracy;
pub use early_stopping::{EarlyStopping, Mode};

/// A metric updated batch by batch during training.
pub trait TrainingMetric<T>
where
    T: Float,
{
    /// Fixed display name, e.g. `"Loss"` or `"Accuracy"`.
    fn name(&self) -> &str;

    /// Folds one batch into the running value.
    fn update(&mut self, labels: &TensorList<T>, predictions: &TensorList<T>) -> Result<()>;

    /// Forgets everything accumulated so far, typically at an epoch boundary.
    fn reset(&mut self);

    /// Running value, NaN when nothing has been accumulated.
    fn value(&self) -> f64;
}

/// Running average: accumulated total divided by accumulated instance count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    total: f64,
    instances: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the sum of `batch` to the total and its element count to the instances.
    pub fn update<T>(&mut self, batch: &Tensor<T>)
    where
        T: Float,
    {
        let sum: f64 = batch.iter().map(|x| x.as_f64()).sum();
        self.add(sum, batch.size());
    }

    /// Adds a pre-reduced total over `instances` elements.
    pub fn add(&mut self, total: f64, instances: usize) {
        self.total += total;
        self.instances += instances;
    }

    pub fn reset(&mut self) {
        self.total = 0.0;
        self.instances = 0;
    }

    /// `total / instances`, or NaN before the first non-empty update.
    pub fn value(&self) -> f64 {
        if self.instances == 0 {
            return f64::NAN;
        }
        self.total / self.instances as f64
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn instances(&self) -> usize {
        self.instances
    }
}
