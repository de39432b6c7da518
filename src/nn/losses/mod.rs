pub mod classification;
pub mod reduction;
pub mod regression;

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::metrics::{Accumulator, TrainingMetric};
use crate::tensor::{Tensor, TensorList};
use std::fmt;

pub use classification::{HingeLoss, SigmoidBinaryCrossEntropyLoss, SoftmaxCrossEntropyLoss};
pub use reduction::{exclude_batch_axis, reduce_to_batch};
pub use regression::{L1Loss, L2Loss};

/// The closed set of loss strategies.
///
/// Each variant carries its immutable configuration and produces, for one label and
/// one prediction tensor, a loss tensor with only the batch axis left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LossKind {
    L1(L1Loss),
    L2(L2Loss),
    SigmoidBinaryCrossEntropy(SigmoidBinaryCrossEntropyLoss),
    SoftmaxCrossEntropy(SoftmaxCrossEntropyLoss),
    Hinge(HingeLoss),
}

impl LossKind {
    pub fn compute<T>(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>>
    where
        T: Float,
    {
        match self {
            LossKind::L1(loss) => loss.compute(label, prediction),
            LossKind::L2(loss) => loss.compute(label, prediction),
            LossKind::SigmoidBinaryCrossEntropy(loss) => loss.compute(label, prediction),
            LossKind::SoftmaxCrossEntropy(loss) => loss.compute(label, prediction),
            LossKind::Hinge(loss) => loss.compute(label, prediction),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            LossKind::L1(loss) => loss.weight,
            LossKind::L2(loss) => loss.weight,
            LossKind::SigmoidBinaryCrossEntropy(loss) => loss.weight,
            LossKind::SoftmaxCrossEntropy(loss) => loss.weight,
            LossKind::Hinge(loss) => loss.weight,
        }
    }

    pub fn batch_axis(&self) -> usize {
        match self {
            LossKind::L1(loss) => loss.batch_axis,
            LossKind::L2(loss) => loss.batch_axis,
            LossKind::SigmoidBinaryCrossEntropy(loss) => loss.batch_axis,
            LossKind::SoftmaxCrossEntropy(loss) => loss.batch_axis,
            LossKind::Hinge(loss) => loss.batch_axis,
        }
    }

    /// Rejects parameters that can never produce a meaningful loss.
    /// Axis ranges depend on the tensors and are checked at compute time.
    pub fn validate(&self) -> Result<()> {
        if !self.weight().is_finite() {
            return Err(LossError::InvalidConfig(format!(
                "loss weight must be finite, got {}",
                self.weight()
            )));
        }
        match self {
            LossKind::Hinge(hinge) if !hinge.margin.is_finite() => Err(LossError::InvalidConfig(
                format!("hinge margin must be finite, got {}", hinge.margin),
            )),
            LossKind::SoftmaxCrossEntropy(ce)
                if ce.class_axis >= 0 && ce.class_axis as usize == ce.batch_axis =>
            {
                Err(LossError::InvalidConfig(format!(
                    "class axis and batch axis must differ, both are {}",
                    ce.batch_axis
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A loss function that also tracks its running average across batches.
///
/// Usage is a two-phase protocol: `calculate_loss` computes and caches the per-batch
/// loss (returned so the caller can differentiate it), then `update` folds the cached
/// value into the running average. `value` reads the average, NaN when nothing has
/// been accumulated.
///
/// # Examples
///
/// ```rust
/// use ferrox_loss::nn::losses::Loss;
/// use ferrox_loss::metrics::TrainingMetric;
/// use ferrox_loss::tensor::{Tensor, TensorList};
///
/// let mut loss = Loss::<f64>::l1();
/// let labels = TensorList::from(Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
/// let predictions = TensorList::from(Tensor::from_vec(vec![0.0, 0.0], &[2]).unwrap());
///
/// let batch_loss = loss.calculate_loss(&labels, &predictions).unwrap();
/// assert_eq!(batch_loss.to_vec(), vec![1.0, 2.0]);
///
/// loss.update(&labels, &predictions).unwrap();
/// assert_eq!(loss.value(), 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct Loss<T>
where
    T: Float,
{
    name: String,
    kind: LossKind,
    accumulator: Accumulator,
    last_computed: Option<Tensor<T>>,
    // Set by calculate_loss, cleared by reset: the cache may only be folded once a
    // fresh epoch has computed something.
    computed_since_reset: bool,
}

impl<T> Loss<T>
where
    T: Float,
{
    pub const DEFAULT_NAME: &'static str = "Loss";

    pub fn new(kind: LossKind) -> Result<Self> {
        Self::with_name(Self::DEFAULT_NAME, kind)
    }

    pub fn with_name(name: impl Into<String>, kind: LossKind) -> Result<Self> {
        kind.validate()?;
        Ok(Self::from_valid(name.into(), kind))
    }

    fn from_valid(name: String, kind: LossKind) -> Self {
        Self {
            name,
            kind,
            accumulator: Accumulator::new(),
            last_computed: None,
            computed_since_reset: false,
        }
    }

    pub fn l1() -> Self {
        Self::from_valid(Self::DEFAULT_NAME.to_string(), LossKind::L1(L1Loss::default()))
    }

    pub fn l1_with(weight: f64, batch_axis: usize) -> Result<Self> {
        Self::new(LossKind::L1(L1Loss::new(weight, batch_axis)))
    }

    pub fn l2() -> Self {
        Self::from_valid(Self::DEFAULT_NAME.to_string(), LossKind::L2(L2Loss::default()))
    }

    pub fn l2_with(weight: f64, batch_axis: usize) -> Result<Self> {
        Self::new(LossKind::L2(L2Loss::new(weight, batch_axis)))
    }

    pub fn sigmoid_binary_cross_entropy() -> Self {
        Self::from_valid(
            Self::DEFAULT_NAME.to_string(),
            LossKind::SigmoidBinaryCrossEntropy(SigmoidBinaryCrossEntropyLoss::default()),
        )
    }

    pub fn sigmoid_binary_cross_entropy_with(
        weight: f64,
        batch_axis: usize,
        from_sigmoid: bool,
    ) -> Result<Self> {
        Self::new(LossKind::SigmoidBinaryCrossEntropy(
            SigmoidBinaryCrossEntropyLoss::new(weight, batch_axis, from_sigmoid),
        ))
    }

    pub fn softmax_cross_entropy() -> Self {
        Self::from_valid(
            Self::DEFAULT_NAME.to_string(),
            LossKind::SoftmaxCrossEntropy(SoftmaxCrossEntropyLoss::default()),
        )
    }

    pub fn softmax_cross_entropy_with(
        weight: f64,
        batch_axis: usize,
        class_axis: isize,
        sparse_label: bool,
        from_logit: bool,
    ) -> Result<Self> {
        Self::new(LossKind::SoftmaxCrossEntropy(SoftmaxCrossEntropyLoss::new(
            weight,
            batch_axis,
            class_axis,
            sparse_label,
            from_logit,
        )))
    }

    pub fn hinge() -> Self {
        Self::from_valid(Self::DEFAULT_NAME.to_string(), LossKind::Hinge(HingeLoss::default()))
    }

    pub fn hinge_with(margin: f64, weight: f64, batch_axis: usize) -> Result<Self> {
        Self::new(LossKind::Hinge(HingeLoss::new(margin, weight, batch_axis)))
    }

    pub fn kind(&self) -> &LossKind {
        &self.kind
    }

    /// Per-batch loss for one label/prediction pair. Touches no state.
    pub fn compute_loss(&self, label: &Tensor<T>, prediction: &Tensor<T>) -> Result<Tensor<T>> {
        self.kind.compute(label, prediction)
    }

    /// Computes the loss of the first label/prediction pair and caches it for `update`.
    ///
    /// Only the head of each list is read; multi-output losses are not supported.
    /// The running average is left untouched. On error the previous cache is kept.
    pub fn calculate_loss(
        &mut self,
        labels: &TensorList<T>,
        predictions: &TensorList<T>,
    ) -> Result<Tensor<T>> {
        let label = labels.head("label")?;
        let prediction = predictions.head("prediction")?;
        let loss = self.compute_loss(label, prediction)?;
        self.last_computed = Some(loss.clone());
        self.computed_since_reset = true;
        Ok(loss)
    }

    /// The loss cached by the last successful `calculate_loss`.
    pub fn last_computed(&self) -> Option<&Tensor<T>> {
        self.last_computed.as_ref()
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Same configuration and name, zeroed running average, nothing cached.
    pub fn duplicate(&self) -> Self {
        Self::from_valid(self.name.clone(), self.kind)
    }

    /// Like `duplicate`, under another metric name (e.g. `"val_loss"`).
    pub fn duplicate_as(&self, name: impl Into<String>) -> Self {
        Self::from_valid(name.into(), self.kind)
    }
}

impl<T> TrainingMetric<T> for Loss<T>
where
    T: Float,
{
    fn name(&self) -> &str {
        &self.name
    }

    /// Folds the loss cached by `calculate_loss` into the running average.
    ///
    /// `labels` and `predictions` are not read again. Meant to be called once per
    /// batch, at the end of it.
    fn update(&mut self, _labels: &TensorList<T>, _predictions: &TensorList<T>) -> Result<()> {
        let last = self
            .last_computed
            .as_ref()
            .filter(|_| self.computed_since_reset)
            .ok_or_else(|| {
                LossError::InvalidState(
                    "no loss has been calculated since construction or reset, call \
                     calculate_loss(labels, predictions) before update()"
                        .to_string(),
                )
            })?;
        self.accumulator.update(last);
        Ok(())
    }

    /// Clears the running average. The cached loss survives but is not folded again
    /// until the next `calculate_loss`.
    fn reset(&mut self) {
        self.accumulator.reset();
        self.computed_since_reset = false;
    }

    fn value(&self) -> f64 {
        self.accumulator.value()
    }
}

impl<T> fmt::Display for Loss<T>
where
    T: Float,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name, self.accumulator.value())
    }
}
