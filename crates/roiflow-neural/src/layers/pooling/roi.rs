use num_traits::{Float, FromPrimitive};
use roiflow_core::ops::lod_reset;
use roiflow_core::{LodTensor, Result, Tensor};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::layers::{FeaturePyramid, RoiExtractor};

/// Construction parameters for [`ROIPool2D`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ROIPoolConfig {
    pub resolution: usize,
    pub spatial_scale: f32,
}

impl Default for ROIPoolConfig {
    fn default() -> Self {
        Self {
            resolution: 7,
            spatial_scale: 1.0 / 16.0,
        }
    }
}

/// Construction parameters for [`ROIAlign2D`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ROIAlignConfig {
    pub resolution: usize,
    pub spatial_scale: f32,
    /// Sampling points per bin axis; 0 picks it per region
    pub sampling_ratio: i32,
}

impl Default for ROIAlignConfig {
    fn default() -> Self {
        Self {
            resolution: 7,
            spatial_scale: 1.0 / 16.0,
            sampling_ratio: 0,
        }
    }
}

/// ROI (Region of Interest) Pooling Layer
/// Used in object detection models like Fast R-CNN
#[derive(Debug, Clone)]
pub struct ROIPool2D {
    pooled_size: (usize, usize),
    spatial_scale: f32,
}

impl ROIPool2D {
    pub fn new(pooled_size: (usize, usize), spatial_scale: f32) -> Self {
        Self {
            pooled_size,
            spatial_scale,
        }
    }

    /// Square pooled size constructor
    pub fn square(size: usize, spatial_scale: f32) -> Self {
        Self::new((size, size), spatial_scale)
    }

    pub fn from_config(config: &ROIPoolConfig) -> Self {
        Self::square(config.resolution, config.spatial_scale)
    }

    /// Pool every region from `feature_maps`; the output keeps the regions' LoD
    pub fn forward<T>(&self, feature_maps: &Tensor<T>, rois: &LodTensor<T>) -> Result<LodTensor<T>>
    where
        T: Float + FromPrimitive + Send + Sync,
    {
        let pooled = roiflow_core::ops::roi_pool2d(
            feature_maps,
            rois,
            self.pooled_size,
            self.spatial_scale,
        )?;
        lod_reset(pooled, rois)
    }
}

impl Default for ROIPool2D {
    fn default() -> Self {
        Self::from_config(&ROIPoolConfig::default())
    }
}

/// ROI Align Layer (improved version of ROI pooling)
/// Uses bilinear interpolation for better gradient flow
#[derive(Debug, Clone)]
pub struct ROIAlign2D {
    pooled_size: (usize, usize),
    spatial_scale: f32,
    sampling_ratio: i32,
}

impl ROIAlign2D {
    pub fn new(pooled_size: (usize, usize), spatial_scale: f32, sampling_ratio: i32) -> Self {
        Self {
            pooled_size,
            spatial_scale,
            sampling_ratio,
        }
    }

    /// Square pooled size constructor
    pub fn square(size: usize, spatial_scale: f32, sampling_ratio: i32) -> Self {
        Self::new((size, size), spatial_scale, sampling_ratio)
    }

    /// Auto sampling ratio constructor (grid size chosen per region)
    pub fn auto_sampling(pooled_size: (usize, usize), spatial_scale: f32) -> Self {
        Self::new(pooled_size, spatial_scale, 0)
    }

    pub fn from_config(config: &ROIAlignConfig) -> Self {
        Self::square(
            config.resolution,
            config.spatial_scale,
            config.sampling_ratio,
        )
    }

    pub fn forward<T>(&self, feature_maps: &Tensor<T>, rois: &LodTensor<T>) -> Result<LodTensor<T>>
    where
        T: Float + FromPrimitive + Send + Sync,
    {
        let aligned = roiflow_core::ops::roi_align2d(
            feature_maps,
            rois,
            self.pooled_size,
            self.spatial_scale,
            self.sampling_ratio,
        )?;
        lod_reset(aligned, rois)
    }
}

impl Default for ROIAlign2D {
    fn default() -> Self {
        Self::from_config(&ROIAlignConfig::default())
    }
}

// Single-level extractors read the last pyramid entry, which is the backbone
// output for non-FPN detectors. The mask flag does not change their resolution.

impl<T> RoiExtractor<T> for ROIPool2D
where
    T: Float + FromPrimitive + Send + Sync,
{
    fn extract(
        &self,
        pyramid: &FeaturePyramid<T>,
        rois: &LodTensor<T>,
        _is_mask: bool,
    ) -> Result<LodTensor<T>> {
        let level = super::last_level(pyramid, "roi_pool2d")?;
        self.forward(level.feature(), rois)
    }

    fn output_resolution(&self, _is_mask: bool) -> (usize, usize) {
        self.pooled_size
    }
}

impl<T> RoiExtractor<T> for ROIAlign2D
where
    T: Float + FromPrimitive + Send + Sync,
{
    fn extract(
        &self,
        pyramid: &FeaturePyramid<T>,
        rois: &LodTensor<T>,
        _is_mask: bool,
    ) -> Result<LodTensor<T>> {
        let level = super::last_level(pyramid, "roi_align2d")?;
        self.forward(level.feature(), rois)
    }

    fn output_resolution(&self, _is_mask: bool) -> (usize, usize) {
        self.pooled_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roiflow_core::Lod;

    fn rois() -> LodTensor<f32> {
        LodTensor::new(
            Tensor::from_vec(
                vec![0.0, 0.0, 63.0, 63.0, 16.0, 16.0, 127.0, 95.0, 0.0, 0.0, 31.0, 31.0],
                &[3, 4],
            )
            .unwrap(),
            Lod::from_lengths(&[2, 1]),
        )
        .unwrap()
    }

    #[test]
    fn test_default_configs() {
        let align = ROIAlignConfig::default();
        assert_eq!(align.resolution, 7);
        assert_eq!(align.spatial_scale, 0.0625);
        assert_eq!(align.sampling_ratio, 0);
        assert_eq!(ROIPoolConfig::default().resolution, 7);
    }

    #[test]
    fn test_roi_align_forward_keeps_lod() {
        let layer = ROIAlign2D::default();
        let features = Tensor::<f32>::full(&[2, 8, 10, 10], 1.5);
        let out = layer.forward(&features, &rois()).unwrap();
        assert_eq!(out.tensor().shape().dims(), &[3, 8, 7, 7]);
        assert_eq!(out.lod().lengths(), vec![2, 1]);
    }

    #[test]
    fn test_roi_pool_forward_keeps_lod() {
        let layer = ROIPool2D::square(4, 1.0 / 16.0);
        let features = Tensor::<f32>::full(&[2, 3, 10, 10], -2.0);
        let out = layer.forward(&features, &rois()).unwrap();
        assert_eq!(out.tensor().shape().dims(), &[3, 3, 4, 4]);
        assert_eq!(out.lod(), rois().lod());
        assert!(out.tensor().to_vec().iter().all(|&v| v == -2.0));
    }

    #[test]
    fn test_extract_uses_last_pyramid_entry() {
        let pyramid = FeaturePyramid::new()
            .with_level("res3", Tensor::<f32>::full(&[2, 4, 20, 20], 9.0), 0.125)
            .with_level("res4", Tensor::<f32>::full(&[2, 4, 10, 10], 1.0), 0.0625);
        let layer = ROIAlign2D::square(2, 1.0 / 16.0, 2);
        let out = layer.extract(&pyramid, &rois(), true).unwrap();
        assert_eq!(out.tensor().shape().dims(), &[3, 4, 2, 2]);
        assert!(out.tensor().to_vec().iter().all(|v| (v - 1.0).abs() < 1e-6));
        assert_eq!(RoiExtractor::<f32>::output_resolution(&layer, true), (2, 2));
    }

    #[test]
    fn test_extract_from_empty_pyramid_fails() {
        let pyramid = FeaturePyramid::<f32>::new();
        assert!(ROIPool2D::default().extract(&pyramid, &rois(), false).is_err());
    }
}
