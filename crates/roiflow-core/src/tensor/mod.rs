//! Tensor Module
//!
//! - **core**: tensor structure and property access
//! - **creation**: constructors
//! - **lod_tensor**: tensors paired with per-row sequence grouping

pub mod core;
pub mod creation;
pub mod lod_tensor;

pub use self::core::Tensor;
pub use self::lod_tensor::LodTensor;
