use ndarray::{LinalgScalar, ScalarOperand};
use rand_distr::num_traits::{self, FromPrimitive};
use std::fmt::{Debug, Display};

/// Scalar element type accepted by tensors and losses.
///
/// Every loss computation needs transcendental functions (`exp`, `ln`, `ln_1p`) and
/// conversions to and from `f64`, because configuration (weights, margins) and the
/// running accumulator are kept in `f64` regardless of the tensor precision.
/// The arithmetic itself comes from `num_traits::Float`, the axis reductions of
/// `ndarray` need `FromPrimitive` and `LinalgScalar`.
pub trait Float:
    num_traits::Float
    + FromPrimitive
    + LinalgScalar
    + ScalarOperand
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
{
    /// Converts an `f64` literal into this type. Precision loss is accepted.
    fn cast(value: f64) -> Self;

    /// Widens the value to `f64` for accumulation.
    fn as_f64(self) -> f64;

    /// Lower bound applied to probabilities before taking their logarithm.
    fn log_epsilon() -> Self {
        Self::cast(1e-12)
    }

    /// Logistic sigmoid, evaluated without overflowing for large negative inputs.
    fn sigmoid(self) -> Self {
        if self >= Self::zero() {
            Self::one() / (Self::one() + (-self).exp())
        } else {
            let e = self.exp();
            e / (Self::one() + e)
        }
    }

    /// `ln(1 + e^x)` in its stable form.
    fn softplus(self) -> Self {
        self.max(Self::zero()) + (-self.abs()).exp().ln_1p()
    }
}

impl Float for f64 {
    fn cast(value: f64) -> Self {
        value
    }

    fn as_f64(self) -> f64 {
        self
    }
}

impl Float for f32 {
    fn cast(value: f64) -> Self {
        value as f32
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}
