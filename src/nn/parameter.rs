use crate::backend::Float;
use crate::error::{LossError, Result};
use crate::initializers::Initializer;
use crate::tensor::Tensor;

/// A learnable tensor whose shape is only known once the owning block sees its input.
///
/// Until [`Parameter::initialize`] runs the parameter holds no data; reading it
/// returns `Uninitialized`.
///
/// # Examples
///
/// ```rust
/// use ferrox_loss::initializers::Initializer;
/// use ferrox_loss::nn::Parameter;
///
/// let mut weight = Parameter::<f64>::new("weight", Initializer::Ones);
/// assert!(!weight.is_initialized());
///
/// weight.initialize(&[2, 3]).unwrap();
/// assert_eq!(weight.shape(), Some(&[2, 3][..]));
/// ```
#[derive(Debug, Clone)]
pub struct Parameter<T>
where
    T: Float,
{
    name: String,
    initializer: Initializer,
    data: Option<Tensor<T>>,
}

impl<T> Parameter<T>
where
    T: Float,
{
    pub fn new(name: impl Into<String>, initializer: Initializer) -> Self {
        Self {
            name: name.into(),
            initializer,
            data: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.data.is_some()
    }

    /// Allocates and fills the data. A second call is a no-op.
    pub fn initialize(&mut self, shape: &[usize]) -> Result<()> {
        if self.data.is_none() {
            self.data = Some(self.initializer.init(shape)?);
        }
        Ok(())
    }

    pub fn data(&self) -> Result<&Tensor<T>> {
        self.data
            .as_ref()
            .ok_or_else(|| LossError::Uninitialized(self.name.clone()))
    }

    pub fn shape(&self) -> Option<&[usize]> {
        self.data.as_ref().map(|d| d.shape())
    }

    /// Returns the number of elements, zero before initialization.
    pub fn size(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.size())
    }
}
