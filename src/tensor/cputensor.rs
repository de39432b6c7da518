use crate::backend::Float;
use crate::error::{LossError, Result};
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use std::ops::Index;

// Tensor wrapper to handle dynamic arrays more elegantly.
// The loss engine never owns the arrays it is handed, it only reads them through
// this type, so the wrapper stays a thin layer over `ndarray::ArrayD`.
#[derive(Debug, Clone, PartialEq)]
pub struct CPUTensor<T>
where
    T: Float,
{
    pub data: ArrayD<T>,
}

// Main implementation block with basic operations
impl<T> CPUTensor<T>
where
    T: Float,
{
    pub fn new(data: ArrayD<T>) -> Self {
        Self { data }
    }

    // Creates a tensor from a Rust vector.
    // This function takes a vector of T and a shape, and returns a tensor with the given shape.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_elements: usize = shape.iter().product();
        if data.len() != total_elements {
            return Err(LossError::ShapeMismatch(format!(
                "Data length {} doesn't match shape {:?} (expected {})",
                data.len(),
                shape,
                total_elements
            )));
        }

        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(Self::new)
            .map_err(|e| LossError::ShapeMismatch(format!("Failed to create tensor: {e}")))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::one())
    }

    pub fn full(shape: &[usize], value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), value))
    }

    // Some utility functions to get information about the tensor.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn iter(&self) -> ndarray::iter::Iter<'_, T, IxDyn> {
        self.data.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    pub fn first(&self) -> Option<T> {
        self.data.iter().next().copied()
    }
}

impl<T> CPUTensor<T>
where
    T: Float,
{
    // Element-wise operations.
    // Binary operations follow numpy broadcasting: shapes are right-aligned and every
    // pair of dimensions must be equal or contain a 1.
    pub fn zip_with<F>(&self, other: &Self, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        let shape = broadcast_shape(self.shape(), other.shape())?;
        let lhs = self.data.broadcast(IxDyn(&shape)).ok_or_else(|| {
            LossError::ShapeMismatch(format!(
                "Cannot broadcast {:?} to {:?}",
                self.shape(),
                shape
            ))
        })?;
        let rhs = other.data.broadcast(IxDyn(&shape)).ok_or_else(|| {
            LossError::ShapeMismatch(format!(
                "Cannot broadcast {:?} to {:?}",
                other.shape(),
                shape
            ))
        })?;

        Ok(Self::new(
            Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| f(a, b)),
        ))
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self::new(self.data.mapv(f))
    }

    pub fn add_scalar(&self, scalar: T) -> Self {
        self.map(|x| x + scalar)
    }

    pub fn mul_scalar(&self, scalar: T) -> Self {
        self.map(|x| x * scalar)
    }

    pub fn neg(&self) -> Self {
        self.map(|x| -x)
    }

    pub fn abs(&self) -> Self {
        self.map(|x| x.abs())
    }

    pub fn clamp(&self, min_val: T, max_val: T) -> Self {
        self.map(|x| x.max(min_val).min(max_val))
    }

    pub fn relu(&self) -> Self {
        self.map(|x| x.max(T::zero()))
    }

    pub fn sigmoid(&self) -> Self {
        self.map(Float::sigmoid)
    }
}

impl<T> CPUTensor<T>
where
    T: Float,
{
    // Reduction operations.

    /// Sum of every element.
    pub fn sum_all(&self) -> T {
        self.data.sum()
    }

    /// Sum over the given axes (all of them when `None`). Reduced axes are removed.
    pub fn sum(&self, axes: Option<&[usize]>) -> Result<Self> {
        self.reduce(axes, |data, axis| Ok(data.sum_axis(axis)))
    }

    /// Mean over the given axes (all of them when `None`). Reduced axes are removed.
    pub fn mean(&self, axes: Option<&[usize]>) -> Result<Self> {
        self.reduce(axes, |data, axis| {
            data.mean_axis(axis).ok_or_else(|| {
                LossError::ShapeMismatch(format!("Cannot take the mean of empty axis {}", axis.0))
            })
        })
    }

    /// Sum along one axis, keeping it with size 1.
    pub fn sum_keep_dim(&self, axis: usize) -> Result<Self> {
        check_axis(axis, self.ndim())?;
        Ok(Self::new(
            self.data.sum_axis(Axis(axis)).insert_axis(Axis(axis)),
        ))
    }

    // Axes are reduced from the highest index down so the remaining indices stay valid.
    fn reduce<F>(&self, axes: Option<&[usize]>, op: F) -> Result<Self>
    where
        F: Fn(&ArrayD<T>, Axis) -> Result<ArrayD<T>>,
    {
        let mut axes: Vec<usize> = match axes {
            Some(axes) => axes.to_vec(),
            None => (0..self.ndim()).collect(),
        };
        for &axis in &axes {
            check_axis(axis, self.ndim())?;
        }
        axes.sort_unstable();
        axes.dedup();

        let mut result = self.data.clone();
        for &axis in axes.iter().rev() {
            result = op(&result, Axis(axis))?;
        }
        Ok(Self::new(result))
    }

    /// Numerically stable log-softmax along `axis` (log-sum-exp with max shift).
    pub fn log_softmax(&self, axis: usize) -> Result<Self> {
        check_axis(axis, self.ndim())?;
        let mut out = self.data.clone();
        for mut lane in out.lanes_mut(Axis(axis)) {
            let max = lane
                .iter()
                .fold(T::neg_infinity(), |acc, &x| acc.max(x));
            let sum = lane
                .iter()
                .fold(T::zero(), |acc, &x| acc + (x - max).exp());
            let log_sum_exp = max + sum.ln();
            lane.mapv_inplace(|x| x - log_sum_exp);
        }
        Ok(Self::new(out))
    }

    /// Index of the largest element along `axis`, as a tensor with that axis removed.
    pub fn argmax(&self, axis: usize) -> Result<Self> {
        check_axis(axis, self.ndim())?;
        Ok(Self::new(self.data.map_axis(Axis(axis), |lane| {
            let mut best = 0usize;
            for (i, &x) in lane.iter().enumerate() {
                if x > lane[best] {
                    best = i;
                }
            }
            T::cast(best as f64)
        })))
    }
}

impl<T> CPUTensor<T>
where
    T: Float,
{
    // Shape manipulation.

    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self> {
        let total_elements: usize = new_shape.iter().product();
        if total_elements != self.size() {
            return Err(LossError::ShapeMismatch(format!(
                "Cannot reshape tensor with {} elements to shape {:?}",
                self.size(),
                new_shape
            )));
        }
        Self::from_vec(self.to_vec(), new_shape)
    }

    /// Lays the elements out in `other`'s shape. Both must hold the same number of
    /// elements; a `[N]` label and an `[N, 1]` prediction line up sample by sample.
    pub fn reshape_like(&self, other: &Self) -> Result<Self> {
        if self.shape() == other.shape() {
            return Ok(self.clone());
        }
        if self.size() != other.size() {
            return Err(LossError::ShapeMismatch(format!(
                "Cannot align shape {:?} with {:?}",
                self.shape(),
                other.shape()
            )));
        }
        self.reshape(other.shape())
    }

    /// Inserts a new axis of size 1 at `axis`.
    pub fn unsqueeze(&self, axis: usize) -> Result<Self> {
        if axis > self.ndim() {
            return Err(LossError::ShapeMismatch(format!(
                "Cannot insert axis {} into tensor of rank {}",
                axis,
                self.ndim()
            )));
        }
        Ok(Self::new(self.data.clone().insert_axis(Axis(axis))))
    }

    /// Removes `axis`, which must have size 1.
    pub fn squeeze(&self, axis: usize) -> Result<Self> {
        check_axis(axis, self.ndim())?;
        if self.shape()[axis] != 1 {
            return Err(LossError::ShapeMismatch(format!(
                "Cannot squeeze axis {} of size {}",
                axis,
                self.shape()[axis]
            )));
        }
        Ok(Self::new(self.data.index_axis(Axis(axis), 0).to_owned()))
    }
}

impl<T> From<ArrayD<T>> for CPUTensor<T>
where
    T: Float,
{
    fn from(data: ArrayD<T>) -> Self {
        Self::new(data)
    }
}

impl<T> Index<&[usize]> for CPUTensor<T>
where
    T: Float,
{
    type Output = T;

    fn index(&self, indices: &[usize]) -> &Self::Output {
        &self.data[IxDyn(indices)]
    }
}

/// Shape produced by broadcasting `a` against `b`.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut shape = vec![0; ndim];
    for i in 0..ndim {
        // Right-aligned: missing leading dimensions behave as 1.
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        shape[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(LossError::ShapeMismatch(format!(
                    "Shapes {:?} and {:?} are not broadcast-compatible",
                    a, b
                )));
            }
        };
    }
    Ok(shape)
}

/// Resolves a possibly negative axis (`-1` is the last one) against `ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(LossError::ShapeMismatch(format!(
            "Axis {} is out of range for tensor of rank {}",
            axis, ndim
        )));
    }
    Ok(resolved as usize)
}

fn check_axis(axis: usize, ndim: usize) -> Result<()> {
    if axis >= ndim {
        return Err(LossError::ShapeMismatch(format!(
            "Axis {} is out of range for tensor of rank {}",
            axis, ndim
        )));
    }
    Ok(())
}
