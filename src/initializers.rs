use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::tensor::Tensor;
use rand::rng;
use rand_distr::{Distribution, Normal, Uniform};

/// How a parameter is filled once its shape is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
    Zeros,
    Ones,
    /// Xavier/Glorot uniform: U(-a, a) with a = gain * sqrt(6 / (fan_in + fan_out))
    XavierUniform { gain: f64 },
    /// Xavier/Glorot normal: N(0, std) with std = gain * sqrt(2 / (fan_in + fan_out))
    XavierNormal { gain: f64 },
    Normal { std: f64 },
}

impl Initializer {
    /// Creates a tensor of `shape` filled according to this initializer.
    pub fn init<T>(&self, shape: &[usize]) -> Result<Tensor<T>>
    where
        T: Float,
    {
        let (fan_in, fan_out) = fans(shape);
        match *self {
            Initializer::Zeros => Ok(Tensor::zeros(shape)),
            Initializer::Ones => Ok(Tensor::ones(shape)),
            Initializer::XavierUniform { gain } => {
                let a = gain * (6.0 / (fan_in + fan_out) as f64).sqrt();
                let uniform = Uniform::new(-a, a).map_err(|e| {
                    LossError::InvalidConfig(format!("Xavier uniform bound {a}: {e}"))
                })?;
                sample(shape, uniform)
            }
            Initializer::XavierNormal { gain } => {
                let std = check_std(gain * (2.0 / (fan_in + fan_out) as f64).sqrt())?;
                let normal = Normal::new(0.0, std)
                    .map_err(|e| LossError::InvalidConfig(format!("Xavier normal std {std}: {e}")))?;
                sample(shape, normal)
            }
            Initializer::Normal { std } => {
                let std = check_std(std)?;
                let normal = Normal::new(0.0, std)
                    .map_err(|e| LossError::InvalidConfig(format!("normal std {std}: {e}")))?;
                sample(shape, normal)
            }
        }
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::XavierUniform { gain: 1.0 }
    }
}

// `Normal::new` accepts a negative deviation and mirrors the distribution.
fn check_std(std: f64) -> Result<f64> {
    if std.is_finite() && std >= 0.0 {
        Ok(std)
    } else {
        Err(LossError::InvalidConfig(format!(
            "standard deviation must be finite and non-negative, got {std}"
        )))
    }
}

// Weight matrices are laid out [fan_out, fan_in], vectors count as [fan_out].
fn fans(shape: &[usize]) -> (usize, usize) {
    let fan_in = if shape.len() >= 2 {
        shape[shape.len() - 1]
    } else {
        1
    };
    let fan_out = if shape.len() >= 2 {
        shape[shape.len() - 2]
    } else if shape.len() == 1 {
        shape[0]
    } else {
        1
    };
    (fan_in, fan_out)
}

fn sample<T, D>(shape: &[usize], distribution: D) -> Result<Tensor<T>>
where
    T: Float,
    D: Distribution<f64>,
{
    let mut rng = rng();
    let total_size: usize = shape.iter().product();
    let data = (0..total_size)
        .map(|_| T::cast(distribution.sample(&mut rng)))
        .collect();
    Tensor::from_vec(data, shape)
}
