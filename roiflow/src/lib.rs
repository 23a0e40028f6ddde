//! # roiflow - Feature-Pyramid RoI Pooling in Pure Rust
//!
//! roiflow pools a fixed-size feature block for every region of interest of a
//! two-stage detector. Regions are routed to the pyramid level matching their
//! scale, pooled there, and returned in their original order:
//!
//! - **FPN RoI Align**: scale-based level assignment over a feature pyramid
//! - **Single-level extractors**: RoI Align and RoI pooling on one feature map
//! - **LoD-aware**: per-image region grouping flows through every operator
//! - **Parallel**: region kernels run on Rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roiflow::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Coarsest level first, as a backbone's FPN neck emits them
//! let pyramid = FeaturePyramid::new()
//!     .with_level("fpn_res5_sum", Tensor::<f32>::zeros(&[1, 256, 25, 34]), 1.0 / 32.0)
//!     .with_level("fpn_res4_sum", Tensor::<f32>::zeros(&[1, 256, 50, 68]), 1.0 / 16.0)
//!     .with_level("fpn_res3_sum", Tensor::<f32>::zeros(&[1, 256, 100, 136]), 1.0 / 8.0)
//!     .with_level("fpn_res2_sum", Tensor::<f32>::zeros(&[1, 256, 200, 272]), 1.0 / 4.0);
//!
//! let rois = LodTensor::single(Tensor::from_vec(
//!     vec![10.0, 20.0, 90.0, 140.0, 0.0, 0.0, 600.0, 400.0],
//!     &[2, 4],
//! )?)?;
//!
//! let extractor = FpnROIAlign::new(FpnROIAlignConfig::default())?;
//! let box_feats = extractor.forward(&pyramid, &rois, false)?;
//! assert_eq!(box_feats.tensor().shape().dims(), &[2, 256, 7, 7]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: tensors, LoD metadata and the detection and pooling operators
//! - [`neural`]: the RoI extractor layers built on those operators
//!
//! ## Feature Flags
//!
//! - `serialize` (default): serde support for configs and tensor metadata

#![deny(missing_docs)]
#![warn(clippy::all)]

pub use roiflow_core as core;
pub use roiflow_neural as neural;

/// Prelude module for convenient imports
///
/// ```rust
/// use roiflow::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::ops;
    pub use crate::core::{Lod, LodTensor, Shape, Tensor, TensorError};

    // Operators
    pub use crate::core::ops::{distribute_fpn_proposals, roi_align2d, roi_pool2d};

    // Extractors
    pub use crate::neural::{
        FeaturePyramid, FpnROIAlign, FpnROIAlignConfig, LevelOrder, PyramidLevel, ROIAlign2D,
        ROIAlignConfig, ROIPool2D, ROIPoolConfig, RoiExtractor, RoiPoolingMethod,
    };
}

/// The version of the roiflow crates
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the version string of roiflow
pub fn version() -> &'static str {
    VERSION
}
