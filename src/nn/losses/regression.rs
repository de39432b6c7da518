// src/nn/losses/regression.rs
// Regression losses: absolute and squared error against continuous targets.

use crate::backend::Float;
use crate::error::Result;
use crate::nn::losses::reduction::reduce_to_batch;
use crate::tensor::Tensor;

/// L1 Loss (mean absolute error): `weight * |label - prediction|`, averaged per sample.
/// More robust to outliers than L2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L1Loss {
    pub weight: f64,
    pub batch_axis: usize,
}

impl L1Loss {
    pub fn new(weight: f64, batch_axis: usize) -> Self {
        Self { weight, batch_axis }
    }

    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let weight = T::cast(self.weight);
        let label = label.reshape_like(prediction)?;
        let loss = label.zip_with(prediction, |y, p| weight * (y - p).abs())?;
        reduce_to_batch(&loss, self.batch_axis)
    }
}

impl Default for L1Loss {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}

/// L2 Loss: `weight / 2 * (label - prediction)^2`, averaged per sample.
/// The halving makes the gradient `weight * (prediction - label)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct L2Loss {
    pub weight: f64,
    pub batch_axis: usize,
}

impl L2Loss {
    pub fn new(weight: f64, batch_axis: usize) -> Self {
        Self { weight, batch_axis }
    }

    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let half_weight = T::cast(self.weight / 2.0);
        let label = label.reshape_like(prediction)?;
        let loss = label.zip_with(prediction, |y, p| {
            let diff = y - p;
            half_weight * diff * diff
        })?;
        reduce_to_batch(&loss, self.batch_axis)
    }
}

impl Default for L2Loss {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}
