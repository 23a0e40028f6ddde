//! # roiflow-neural
//!
//! Region-of-interest feature extractors for two-stage detectors: RoI Align
//! and RoI pooling on a single feature map, and RoI Align across a feature
//! pyramid with scale-based level assignment.

pub mod layers;

pub use layers::{
    FeaturePyramid, FpnROIAlign, FpnROIAlignConfig, LevelOrder, PyramidLevel, ROIAlign2D,
    ROIAlignConfig, ROIPool2D, ROIPoolConfig, RoiExtractor, RoiPoolingMethod,
};
