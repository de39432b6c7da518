// Neural network building blocks: losses, lazily initialized parameters and the
// recurrent cell configuration.

pub mod block;
pub mod losses;
pub mod parameter;
pub mod recurrent;

pub use block::ParameterBlock;
pub use losses::{Loss, LossKind};
pub use parameter::Parameter;
pub use recurrent::{
    Activation, RecurrentCell, RecurrentCellBuilder, RecurrentCellConfig, RecurrentMode,
};
