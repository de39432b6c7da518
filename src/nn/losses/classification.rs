// src/nn/losses/classification.rs
// Classification losses: binary cross entropy, softmax cross entropy and hinge.
// All of them reduce to one value per batch element through `reduce_to_batch`.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::nn::losses::reduction::reduce_to_batch;
use crate::tensor::{Tensor, normalize_axis};
use ndarray::{Axis, Zip};

/// Binary Cross Entropy with a built-in sigmoid.
///
/// With `from_sigmoid == false` predictions are logits `x` and the loss is evaluated in
/// the overflow-free form `max(x, 0) - x * y + ln(1 + e^{-|x|})`.
/// With `from_sigmoid == true` predictions are probabilities `p` and the loss is
/// `-(y ln p + (1 - y) ln(1 - p))`, with both logarithms clamped away from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidBinaryCrossEntropyLoss {
    pub weight: f64,
    pub batch_axis: usize,
    pub from_sigmoid: bool,
}

impl SigmoidBinaryCrossEntropyLoss {
    pub fn new(weight: f64, batch_axis: usize, from_sigmoid: bool) -> Self {
        Self {
            weight,
            batch_axis,
            from_sigmoid,
        }
    }

    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let weight = T::cast(self.weight);
        let label = &label.reshape_like(prediction)?;
        let loss = if self.from_sigmoid {
            let eps = T::log_epsilon();
            prediction.zip_with(label, |p, y| {
                let log_p = p.max(eps).ln();
                let log_not_p = (T::one() - p).max(eps).ln();
                -weight * (y * log_p + (T::one() - y) * log_not_p)
            })?
        } else {
            prediction.zip_with(label, |x, y| weight * (x.softplus() - x * y))?
        };
        reduce_to_batch(&loss, self.batch_axis)
    }
}

impl Default for SigmoidBinaryCrossEntropyLoss {
    fn default() -> Self {
        Self::new(1.0, 0, false)
    }
}

/// Softmax Cross Entropy over `class_axis`.
///
/// `from_logit == true` means predictions are raw scores and a log-softmax is applied
/// first; otherwise predictions are already probabilities and only a clamped log is
/// taken. Sparse labels hold class indices and have the class axis removed (or of
/// size 1); dense labels are one-hot or soft distributions shaped like the prediction.
/// The class axis is kept with size 1 before the per-sample mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftmaxCrossEntropyLoss {
    pub weight: f64,
    pub batch_axis: usize,
    pub class_axis: isize,
    pub sparse_label: bool,
    pub from_logit: bool,
}

impl SoftmaxCrossEntropyLoss {
    pub fn new(
        weight: f64,
        batch_axis: usize,
        class_axis: isize,
        sparse_label: bool,
        from_logit: bool,
    ) -> Self {
        Self {
            weight,
            batch_axis,
            class_axis,
            sparse_label,
            from_logit,
        }
    }

    /// Sparse labels, logits in, class axis last.
    pub fn from_logits() -> Self {
        Self::default()
    }

    /// Dense (one-hot or soft) labels against probabilities.
    pub fn from_probabilities() -> Self {
        Self::new(1.0, 0, -1, false, false)
    }

    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let class_axis = normalize_axis(self.class_axis, prediction.ndim())?;
        if class_axis == self.batch_axis {
            return Err(LossError::ShapeMismatch(format!(
                "Class axis and batch axis both resolve to axis {}",
                class_axis
            )));
        }

        let log_probs = if self.from_logit {
            prediction.log_softmax(class_axis)?
        } else {
            let eps = T::log_epsilon();
            prediction.map(|p| p.max(eps).ln())
        };

        let loss = if self.sparse_label {
            pick_class(&log_probs, label, class_axis)?.neg()
        } else {
            if label.shape() != prediction.shape() {
                return Err(LossError::ShapeMismatch(format!(
                    "Dense label {:?} must match prediction {:?}",
                    label.shape(),
                    prediction.shape()
                )));
            }
            log_probs.mul(label)?.sum_keep_dim(class_axis)?.neg()
        };

        reduce_to_batch(&loss.mul_scalar(T::cast(self.weight)), self.batch_axis)
    }
}

impl Default for SoftmaxCrossEntropyLoss {
    fn default() -> Self {
        Self::new(1.0, 0, -1, true, true)
    }
}

// Gathers log_probs[.., label, ..] along the class axis, keeping that axis with size 1.
fn pick_class<T>(log_probs: &Tensor<T>, label: &Tensor<T>, class_axis: usize) -> Result<Tensor<T>>
where
    T: Float,
{
    let num_classes = log_probs.shape()[class_axis];
    let mut expected = log_probs.shape().to_vec();
    expected.remove(class_axis);

    let indices = if label.shape() == expected.as_slice() {
        label.clone()
    } else if label.ndim() == log_probs.ndim() && label.shape()[class_axis] == 1 {
        label.squeeze(class_axis)?
    } else {
        return Err(LossError::ShapeMismatch(format!(
            "Sparse label {:?} does not match prediction {:?} without class axis {}",
            label.shape(),
            log_probs.shape(),
            class_axis
        )));
    };
    if indices.shape() != expected.as_slice() {
        return Err(LossError::ShapeMismatch(format!(
            "Sparse label {:?} does not match expected shape {:?}",
            label.shape(),
            expected
        )));
    }

    for &index in indices.iter() {
        let value = index.as_f64();
        if !(value >= 0.0 && value.fract() == 0.0 && (value as usize) < num_classes) {
            return Err(LossError::InvalidLabel(format!(
                "{} is not a class index in [0, {})",
                value, num_classes
            )));
        }
    }

    let picked = Zip::from(log_probs.data().lanes(Axis(class_axis)))
        .and(indices.data())
        .map_collect(|lane, &index| lane[index.as_f64() as usize]);
    Tensor::new(picked).unsqueeze(class_axis)
}

/// Hinge Loss: `weight * max(0, margin - label * prediction)` with labels in {-1, 1}.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeLoss {
    pub margin: f64,
    pub weight: f64,
    pub batch_axis: usize,
}

impl HingeLoss {
    pub fn new(margin: f64, weight: f64, batch_axis: usize) -> Self {
        Self {
            margin,
            weight,
            batch_axis,
        }
    }

    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let margin = T::cast(self.margin);
        let weight = T::cast(self.weight);
        let label = label.reshape_like(prediction)?;
        let loss = label.zip_with(prediction, |y, p| weight * (margin - y * p).max(T::zero()))?;
        reduce_to_batch(&loss, self.batch_axis)
    }
}

impl Default for HingeLoss {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0)
    }
}
