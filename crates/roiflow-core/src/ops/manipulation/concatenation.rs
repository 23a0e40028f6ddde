//! Concatenation of tensors along an axis

use crate::{Result, Tensor, TensorError};
use ndarray::Axis;

/// Concatenate tensors along a specified axis.
///
/// All inputs must agree on every dimension except `axis`. Inputs with a zero
/// extent along `axis` are allowed and contribute nothing.
pub fn concat<T>(tensors: &[&Tensor<T>], axis: usize) -> Result<Tensor<T>>
where
    T: Clone,
{
    let first = tensors.first().ok_or_else(|| {
        TensorError::invalid_argument_op("concat", "cannot concatenate an empty tensor list")
    })?;

    let rank = first.rank();
    if axis >= rank {
        return Err(TensorError::invalid_axis("concat", axis, rank));
    }

    for tensor in &tensors[1..] {
        let dims = tensor.shape().dims();
        let compatible = dims.len() == rank
            && dims
                .iter()
                .zip(first.shape().dims())
                .enumerate()
                .all(|(i, (a, b))| i == axis || a == b);
        if !compatible {
            return Err(TensorError::shape_mismatch(
                "concat",
                &first.shape().to_string(),
                &tensor.shape().to_string(),
            ));
        }
    }

    let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();
    let concatenated = ndarray::concatenate(Axis(axis), &views)?;
    Ok(Tensor::from_array(concatenated))
}
