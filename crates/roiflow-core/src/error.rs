use thiserror::Error;

/// Errors raised by tensor construction and the RoI operators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    #[error("Invalid shape in operation '{operation}': {reason}")]
    InvalidShape {
        operation: String,
        reason: String,
        shape: Option<Vec<usize>>,
    },

    #[error("Invalid axis {axis} in operation '{operation}' for tensor with {ndim} dimensions")]
    InvalidAxis {
        operation: String,
        axis: usize,
        ndim: usize,
    },

    #[error("Invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Index {index} out of bounds in operation '{operation}' for axis of size {size}")]
    IndexOutOfBounds {
        operation: String,
        index: i64,
        size: usize,
    },

    #[error("LoD mismatch in operation '{operation}': {reason}")]
    LodMismatch { operation: String, reason: String },
}

impl TensorError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(operation: &str, expected: &str, got: &str) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Create an invalid shape error carrying the offending shape
    pub fn invalid_shape(operation: &str, reason: &str, shape: &[usize]) -> Self {
        Self::InvalidShape {
            operation: operation.to_string(),
            reason: reason.to_string(),
            shape: Some(shape.to_vec()),
        }
    }

    /// Create an invalid shape error without operation context
    pub fn invalid_shape_simple(reason: String) -> Self {
        Self::InvalidShape {
            operation: "unknown".to_string(),
            reason,
            shape: None,
        }
    }

    pub fn invalid_axis(operation: &str, axis: usize, ndim: usize) -> Self {
        Self::InvalidAxis {
            operation: operation.to_string(),
            axis,
            ndim,
        }
    }

    /// Create an invalid argument error with operation context
    pub fn invalid_argument_op(operation: &str, reason: &str) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn index_out_of_bounds(operation: &str, index: i64, size: usize) -> Self {
        Self::IndexOutOfBounds {
            operation: operation.to_string(),
            index,
            size,
        }
    }

    pub fn lod_mismatch(operation: &str, reason: &str) -> Self {
        Self::LodMismatch {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the operation name for this error
    pub fn operation(&self) -> &str {
        match self {
            Self::ShapeMismatch { operation, .. } => operation,
            Self::InvalidShape { operation, .. } => operation,
            Self::InvalidAxis { operation, .. } => operation,
            Self::InvalidArgument { operation, .. } => operation,
            Self::IndexOutOfBounds { operation, .. } => operation,
            Self::LodMismatch { operation, .. } => operation,
        }
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;

impl From<ndarray::ShapeError> for TensorError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::InvalidShape {
            operation: "tensor_creation".to_string(),
            reason: format!("Shape error: {err}"),
            shape: None,
        }
    }
}
