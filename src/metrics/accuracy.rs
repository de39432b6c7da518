use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::metrics::{Accumulator, TrainingMetric};
use crate::tensor::{Tensor, TensorList, normalize_axis};
use std::fmt;

/// Running classification accuracy.
///
/// When the prediction has at least two axes and its class axis has more than one
/// entry, the predicted class is the argmax along that axis; labels may then be class
/// indices (class axis removed or of size 1) or one-hot vectors. Otherwise the
/// prediction is a binary score compared against `threshold`, and labels are 0/1.
#[derive(Debug, Clone)]
pub struct Accuracy {
    name: String,
    class_axis: isize,
    threshold: f64,
    accumulator: Accumulator,
}

impl Accuracy {
    pub fn new(class_axis: isize, threshold: f64) -> Self {
        Self {
            name: "Accuracy".to_string(),
            class_axis,
            threshold,
            accumulator: Accumulator::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Same configuration, nothing accumulated.
    pub fn duplicate(&self) -> Self {
        Self::new(self.class_axis, self.threshold).with_name(self.name.clone())
    }

    // Returns (predicted classes, true classes) with identical shapes.
    fn classes<T>(
        &self,
        label: &Tensor<T>,
        prediction: &Tensor<T>,
    ) -> Result<(Tensor<T>, Tensor<T>)>
    where
        T: Float,
    {
        // A one-dimensional prediction only has the batch axis.
        let class_axis = match prediction.ndim() {
            0 | 1 => None,
            ndim => {
                let axis = normalize_axis(self.class_axis, ndim)?;
                (prediction.shape()[axis] > 1).then_some(axis)
            }
        };

        let Some(axis) = class_axis else {
            let threshold = T::cast(self.threshold);
            let predicted = prediction.map(|p| if p >= threshold { T::one() } else { T::zero() });
            // A [N] label against an [N, 1] score (or the reverse) pairs up per sample.
            let truth = label.reshape_like(&predicted)?;
            return Ok((predicted, truth));
        };

        let predicted = prediction.argmax(axis)?;
        let truth = if label.shape() == predicted.shape() {
            label.clone()
        } else if label.shape() == prediction.shape() {
            label.argmax(axis)?
        } else if label.ndim() == prediction.ndim() && label.shape()[axis] == 1 {
            label.squeeze(axis)?
        } else {
            return Err(LossError::ShapeMismatch(format!(
                "Label {:?} does not match prediction {:?} with class axis {}",
                label.shape(),
                prediction.shape(),
                axis
            )));
        };
        Ok((predicted, truth))
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::new(-1, 0.5)
    }
}

impl<T> TrainingMetric<T> for Accuracy
where
    T: Float,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, labels: &TensorList<T>, predictions: &TensorList<T>) -> Result<()> {
        let label = labels.head("label")?;
        let prediction = predictions.head("prediction")?;
        let (predicted, truth) = self.classes(label, prediction)?;
        if predicted.shape() != truth.shape() {
            return Err(LossError::ShapeMismatch(format!(
                "Predicted classes {:?} and labels {:?} differ in shape",
                predicted.shape(),
                truth.shape()
            )));
        }

        let correct = predicted
            .iter()
            .zip(truth.iter())
            .filter(|(p, t)| (p.as_f64() - t.as_f64()).abs() < 0.5)
            .count();
        self.accumulator.add(correct as f64, predicted.size());
        Ok(())
    }

    fn reset(&mut self) {
        self.accumulator.reset();
    }

    fn value(&self) -> f64 {
        self.accumulator.value()
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name, self.accumulator.value())
    }
}
