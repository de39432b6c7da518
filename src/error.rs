//! Error types for ferrox-loss

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LossError {
    /// `update` was called with no cached loss to fold in.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Empty {0} list: at least one tensor is required")]
    EmptyTensorList(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parameter '{0}' has not been initialized")]
    Uninitialized(String),
}

pub type Result<T> = std::result::Result<T, LossError>;
