pub mod pooling;
pub mod pyramid;

pub use pooling::{
    FpnROIAlign, FpnROIAlignConfig, LevelOrder, ROIAlign2D, ROIAlignConfig, ROIPool2D,
    ROIPoolConfig, RoiPoolingMethod,
};
pub use pyramid::{FeaturePyramid, PyramidLevel};

use roiflow_core::{LodTensor, Result};

/// Layers that turn regions of interest into fixed-size feature blocks.
///
/// Detection heads are wired with a concrete extractor at model construction;
/// `is_mask` selects the mask-head output resolution where an extractor has one.
pub trait RoiExtractor<T> {
    fn extract(
        &self,
        pyramid: &FeaturePyramid<T>,
        rois: &LodTensor<T>,
        is_mask: bool,
    ) -> Result<LodTensor<T>>;

    /// `(height, width)` of every pooled block
    fn output_resolution(&self, is_mask: bool) -> (usize, usize);
}
