//! # roiflow-core
//!
//! Dense CPU tensors and the operators a feature-pyramid RoI extractor is
//! composed from: FPN level distribution, RoI Align / RoI pooling kernels,
//! concatenation, gather and LoD (per-image grouping) handling.

pub mod error;
pub mod lod;
pub mod ops;
pub mod shape;
pub mod tensor;

pub use error::{Result, TensorError};
pub use lod::Lod;
pub use shape::Shape;
pub use tensor::{LodTensor, Tensor};
