// RoI pooling layers organized by input type

pub mod fpn_roi;
pub mod roi;

pub use fpn_roi::{FpnROIAlign, FpnROIAlignConfig, LevelOrder, RoiPoolingMethod};
pub use roi::{ROIAlign2D, ROIAlignConfig, ROIPool2D, ROIPoolConfig};

use crate::layers::{FeaturePyramid, PyramidLevel};
use roiflow_core::{Result, TensorError};

/// Last pyramid entry, the input of single-level extractors
pub(crate) fn last_level<'a, T>(
    pyramid: &'a FeaturePyramid<T>,
    operation: &str,
) -> Result<&'a PyramidLevel<T>> {
    pyramid.last().ok_or_else(|| {
        TensorError::invalid_argument_op(operation, "feature pyramid has no levels")
    })
}
