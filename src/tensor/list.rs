use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::tensor::CPUTensor;

/// Ordered sequence of tensors, one per model output (or label).
///
/// Losses and metrics only consume the head today; the remaining entries are carried
/// so a multi-output model can hand over its whole output without reshuffling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TensorList<T>
where
    T: Float,
{
    tensors: Vec<CPUTensor<T>>,
}

impl<T> TensorList<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self {
            tensors: Vec::new(),
        }
    }

    pub fn push(&mut self, tensor: CPUTensor<T>) {
        self.tensors.push(tensor);
    }

    /// First tensor of the list, or `EmptyTensorList` naming the role of the list.
    pub fn head(&self, role: &'static str) -> Result<&CPUTensor<T>> {
        self.tensors.first().ok_or(LossError::EmptyTensorList(role))
    }

    pub fn get(&self, index: usize) -> Option<&CPUTensor<T>> {
        self.tensors.get(index)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CPUTensor<T>> {
        self.tensors.iter()
    }
}

impl<T> From<CPUTensor<T>> for TensorList<T>
where
    T: Float,
{
    fn from(tensor: CPUTensor<T>) -> Self {
        Self {
            tensors: vec![tensor],
        }
    }
}

impl<T> From<Vec<CPUTensor<T>>> for TensorList<T>
where
    T: Float,
{
    fn from(tensors: Vec<CPUTensor<T>>) -> Self {
        Self { tensors }
    }
}

impl<T> FromIterator<CPUTensor<T>> for TensorList<T>
where
    T: Float,
{
    fn from_iter<I: IntoIterator<Item = CPUTensor<T>>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}
