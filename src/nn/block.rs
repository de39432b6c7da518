use crate::backend::Float;
use crate::error::Result;
use crate::nn::parameter::Parameter;

/// A block that owns its parameters directly and has no child blocks.
///
/// Parameter shapes depend on the input, so they are allocated on the first call to
/// [`ParameterBlock::initialize`]. Later calls skip allocation and only recompute the
/// output shapes.
pub trait ParameterBlock<T>
where
    T: Float,
{
    /// Validates the input shapes and records whatever the parameter shapes depend on.
    fn before_initialize(&mut self, input_shapes: &[Vec<usize>]) -> Result<()>;

    /// Shape each direct parameter must take, in the order of `direct_parameters_mut`.
    fn parameter_shapes(&self) -> Vec<Vec<usize>>;

    fn direct_parameters(&self) -> Vec<&Parameter<T>>;

    fn direct_parameters_mut(&mut self) -> Vec<&mut Parameter<T>>;

    fn output_shapes(&self, input_shapes: &[Vec<usize>]) -> Result<Vec<Vec<usize>>>;

    fn is_initialized(&self) -> bool;

    fn set_initialized(&mut self);

    /// Allocates every direct parameter once, then returns the output shapes.
    fn initialize(&mut self, input_shapes: &[Vec<usize>]) -> Result<Vec<Vec<usize>>> {
        if !self.is_initialized() {
            self.before_initialize(input_shapes)?;
            let shapes = self.parameter_shapes();
            for (parameter, shape) in self.direct_parameters_mut().into_iter().zip(shapes) {
                parameter.initialize(&shape)?;
            }
            self.set_initialized();
        }
        self.output_shapes(input_shapes)
    }

    /// Total number of learnable elements, zero before initialization.
    fn num_parameters(&self) -> usize {
        self.direct_parameters().iter().map(|p| p.size()).sum()
    }
}
