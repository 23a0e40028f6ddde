//! Re-attaching sequence grouping to tensors

use crate::{Lod, LodTensor, Result, Tensor, TensorError};

/// Attach `target`'s grouping to `x`.
///
/// `x` must have as many rows as `target`. Used after per-level pooling to give
/// the pooled features the image grouping of the regions they came from.
pub fn lod_reset<T, U>(x: Tensor<T>, target: &LodTensor<U>) -> Result<LodTensor<T>> {
    lod_reset_with(x, target.lod().clone())
}

/// Attach an explicit grouping to `x`
pub fn lod_reset_with<T>(x: Tensor<T>, lod: Lod) -> Result<LodTensor<T>> {
    let rows = x.shape().rows();
    if rows != lod.total() {
        return Err(TensorError::lod_mismatch(
            "lod_reset",
            &format!(
                "tensor has {rows} rows but the target LoD covers {}",
                lod.total()
            ),
        ));
    }
    LodTensor::new(x, lod)
}
