pub mod cputensor;
pub mod list;


pub use cputensor::{CPUTensor, broadcast_shape, normalize_axis};
pub use list::TensorList;

pub type Tensor<T> = CPUTensor<T>;
