//! Tensors carrying per-row sequence grouping

use super::core::Tensor;
use crate::{Lod, Result, TensorError};

/// A tensor whose leading dimension is grouped into sequences by a [`Lod`].
///
/// Region-of-interest tensors use this to remember which image every box
/// belongs to while the boxes travel through distribution and pooling.
#[derive(Debug, Clone, PartialEq)]
pub struct LodTensor<T> {
    tensor: Tensor<T>,
    lod: Lod,
}

impl<T> LodTensor<T> {
    /// Pair a tensor with its grouping. The grouping must cover every row.
    pub fn new(tensor: Tensor<T>, lod: Lod) -> Result<Self> {
        if tensor.rank() == 0 {
            return Err(TensorError::invalid_shape(
                "lod_tensor",
                "LoD tensors need at least one dimension",
                tensor.shape().dims(),
            ));
        }
        lod.validate()?;
        let rows = tensor.shape().rows();
        if lod.total() != rows {
            return Err(TensorError::lod_mismatch(
                "lod_tensor",
                &format!("LoD covers {} rows, tensor has {rows}", lod.total()),
            ));
        }
        Ok(Self { tensor, lod })
    }

    /// Treat every row as belonging to a single sequence
    pub fn single(tensor: Tensor<T>) -> Result<Self> {
        let rows = tensor.shape().rows();
        Self::new(tensor, Lod::single(rows))
    }

    pub fn tensor(&self) -> &Tensor<T> {
        &self.tensor
    }

    pub fn lod(&self) -> &Lod {
        &self.lod
    }

    pub fn rows(&self) -> usize {
        self.tensor.shape().rows()
    }

    pub fn into_parts(self) -> (Tensor<T>, Lod) {
        (self.tensor, self.lod)
    }
}
