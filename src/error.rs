//! Object model errors

use thiserror::Error;

/// Errors raised by the object model.
///
/// All of these are contract violations detected before any mutation takes
/// place, so a failed call leaves every node as it was.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Bad input shape: empty class name, non-container source, ...
    #[error("{0}")]
    InvalidArgument(String),

    /// Wrong receiver for the requested operation
    #[error("{0}")]
    InvalidOperation(String),

    #[error("cannot add property {0}, object is not extensible")]
    NotExtensible(String),

    #[error("cannot assign to read only property '{0}'")]
    NotWritable(String),

    #[error("cannot redefine property: {0}")]
    NotConfigurable(String),

    /// Failure raised by user code (methods, accessors, initializers)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ObjectError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        ObjectError::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        ObjectError::InvalidOperation(msg.into())
    }
}

/// Result alias used across the crate
pub type Result<T, E = ObjectError> = std::result::Result<T, E>;
