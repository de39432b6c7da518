// src/nn/losses/reduction.rs
// Batch-axis aware reduction shared by every loss variant.

use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::tensor::Tensor;

/// All axes of a rank-`rank` tensor except `batch_axis`, in ascending order.
///
/// Losses reduce over these axes so that one value per batch element remains.
///
/// ```
/// use ferrox_loss::nn::losses::exclude_batch_axis;
///
/// assert_eq!(exclude_batch_axis(4, 0).unwrap(), vec![1, 2, 3]);
/// assert_eq!(exclude_batch_axis(3, 2).unwrap(), vec![0, 1]);
/// ```
pub fn exclude_batch_axis(rank: usize, batch_axis: usize) -> Result<Vec<usize>> {
    if batch_axis >= rank {
        return Err(LossError::ShapeMismatch(format!(
            "Batch axis {} is out of range for tensor of rank {}",
            batch_axis, rank
        )));
    }
    Ok((0..rank).filter(|&axis| axis != batch_axis).collect())
}

/// Averages `loss` over every non-batch axis, leaving a tensor of shape `[batch]`.
pub fn reduce_to_batch<T>(loss: &Tensor<T>, batch_axis: usize) -> Result<Tensor<T>>
where
    T: Float,
{
    let axes = exclude_batch_axis(loss.ndim(), batch_axis)?;
    if axes.is_empty() {
        return Ok(loss.clone());
    }
    loss.mean(Some(axes.as_slice()))
}

#[cfg(test)]
mod reduction_tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exclude_batch_axis_examples() {
        assert_eq!(exclude_batch_axis(4, 0).unwrap(), vec![1, 2, 3]);
        assert_eq!(exclude_batch_axis(3, 2).unwrap(), vec![0, 1]);
        assert_eq!(exclude_batch_axis(1, 0).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_exclude_batch_axis_out_of_range_fails() {
        assert!(matches!(
            exclude_batch_axis(2, 2),
            Err(LossError::ShapeMismatch(_))
        ));
        assert!(exclude_batch_axis(0, 0).is_err());
    }

    #[test]
    fn test_reduce_to_batch_keeps_batch_axis() {
        // [2, 3] with batch on axis 1: average the two rows per column.
        let loss = Tensor::from_vec(vec![1.0, 2.0, 3.0, 3.0, 4.0, 5.0], &[2, 3]).unwrap();
        let reduced = reduce_to_batch(&loss, 1).unwrap();
        assert_eq!(reduced.shape(), &[3]);
        assert_eq!(reduced.to_vec(), vec![2.0, 3.0, 4.0]);
    }

    proptest! {
        #[test]
        fn prop_exclude_batch_axis_is_complement(rank in 1usize..8, seed in 0usize..64) {
            let batch_axis = seed % rank;
            let axes = exclude_batch_axis(rank, batch_axis).unwrap();

            prop_assert_eq!(axes.len(), rank - 1);
            prop_assert!(!axes.contains(&batch_axis));
            prop_assert!(axes.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(axes.iter().all(|&a| a < rank));
        }
    }
}
