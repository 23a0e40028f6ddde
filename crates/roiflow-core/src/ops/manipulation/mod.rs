//! Tensor manipulation operations
//!
//! - concatenation: joining tensors along an axis
//! - indexing: gathering slices by index
//! - lod: attaching sequence grouping to results

pub mod concatenation;
pub mod indexing;
pub mod lod;

pub use concatenation::concat;
pub use indexing::gather;
pub use lod::{lod_reset, lod_reset_with};
