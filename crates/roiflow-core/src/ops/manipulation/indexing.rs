//! Index-based selection

use crate::{Result, Tensor, TensorError};
use ndarray::Axis;

/// Gather slices of `params` along `axis` at the given indices.
///
/// `indices` is flattened first, so an `[N, 1]` index tensor behaves like an
/// `[N]` one. The output has `params`' shape with `axis` replaced by the number
/// of indices.
pub fn gather<T>(params: &Tensor<T>, indices: &Tensor<i32>, axis: usize) -> Result<Tensor<T>>
where
    T: Clone,
{
    let rank = params.rank();
    if axis >= rank {
        return Err(TensorError::invalid_axis("gather", axis, rank));
    }

    let size = params.shape()[axis];
    let positions = indices
        .view()
        .iter()
        .map(|&index| {
            usize::try_from(index)
                .ok()
                .filter(|&i| i < size)
                .ok_or_else(|| TensorError::index_out_of_bounds("gather", index as i64, size))
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok(Tensor::from_array(params.view().select(Axis(axis), &positions)))
}
