//! # Ferrox Loss
//!
//! Training losses and running metrics for CPU tensors backed by `ndarray`.
//!
//! ## Features
//!
//! - L1, L2, sigmoid binary cross-entropy, softmax cross-entropy and hinge losses
//! - Batch-axis reduction helpers
//! - Two-phase loss metrics: compute a batch loss, then fold it into a running mean
//! - Accuracy and early stopping on top of the same metric interface
//! - Lazily initialized parameters and a recurrent cell configuration builder
//!
pub mod backend;
pub mod error;
pub mod initializers;
pub mod metrics;
pub mod nn;
pub mod tensor;

pub use backend::Float;
pub use error::{LossError, Result};
pub use metrics::{Accumulator, TrainingMetric};
pub use nn::{Loss, LossKind};
pub use tensor::{Tensor, TensorList};
