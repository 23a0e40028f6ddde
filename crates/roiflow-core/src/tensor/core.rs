//! Core Tensor Structure and Properties
//!
//! The tensor is a dense, row-major, CPU-resident n-dimensional array plus its
//! shape. All RoI operators read and write through this type.

use crate::Shape;
use ndarray::{ArrayD, ArrayViewD};

/// Core tensor structure that holds data and metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub(in crate::tensor) data: ArrayD<T>,
    pub(in crate::tensor) shape: Shape,
}

impl<T> Tensor<T> {
    /// Get the shape of the tensor
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Borrow the underlying ndarray
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.data.view()
    }

    /// Consume the tensor and return the underlying ndarray
    pub fn into_array(self) -> ArrayD<T> {
        self.data
    }

    /// Get the value at a specific index
    pub fn get(&self, index: &[usize]) -> Option<T>
    where
        T: Clone,
    {
        if index.len() != self.data.ndim() {
            return None;
        }
        self.data.get(index).cloned()
    }

    /// Get the underlying data as a slice, `None` if not in standard layout
    pub fn as_slice(&self) -> Option<&[T]> {
        self.data.as_slice()
    }

    /// Copy the elements out in row-major order
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.iter().cloned().collect()
    }

    /// Check if tensor is empty (has no elements)
    pub fn is_empty(&self) -> bool {
        self.shape.size() == 0
    }

    /// Get the total number of elements
    pub fn numel(&self) -> usize {
        self.shape.size()
    }

    /// Get the number of dimensions (rank)
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Check if tensor data is contiguous in memory
    pub fn is_contiguous(&self) -> bool {
        self.data.is_standard_layout()
    }
}
