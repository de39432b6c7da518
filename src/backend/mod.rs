pub mod numeric;

pub use numeric::Float;
