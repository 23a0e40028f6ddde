//! Tensor Creation and Construction

use super::core::Tensor;
use crate::{Result, Shape, TensorError};
use ndarray::{ArrayD, IxDyn};

impl<T: Clone> Tensor<T> {
    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self
    where
        T: num_traits::Zero,
    {
        Self::from_array(ArrayD::zeros(IxDyn(shape)))
    }

    /// Create a tensor filled with a specific value
    pub fn full(shape: &[usize], value: T) -> Self {
        Self::from_array(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Create a tensor from a row-major data vector with the given shape
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_size: usize = shape.iter().product();
        if data.len() != total_size {
            return Err(TensorError::invalid_shape_simple(format!(
                "Data length {} doesn't match shape {:?} (size {})",
                data.len(),
                shape,
                total_size
            )));
        }

        let array = ArrayD::from_shape_vec(IxDyn(shape), data)?;
        Ok(Self::from_array(array))
    }

    /// Create a tensor from an existing ndarray
    pub fn from_array(array: ArrayD<T>) -> Self {
        // Normalise to standard layout so `as_slice` is always available
        let data = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let shape = Shape::from_slice(data.shape());
        Self { data, shape }
    }
}
