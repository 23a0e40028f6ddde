//! RoI Align over FPN feature maps
//!
//! Regions are distributed to pyramid levels by scale, pooled from their own
//! level, and the pooled features are put back into the caller's region order
//! with the regions' per-image grouping reattached.

use num_traits::{Float, FromPrimitive};
use roiflow_core::ops::{
    concat, distribute_fpn_proposals, gather, lod_reset, roi_align2d, roi_pool2d,
};
use roiflow_core::{LodTensor, Result, Tensor, TensorError};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::layers::{FeaturePyramid, PyramidLevel, RoiExtractor};

/// Per-level pooling operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum RoiPoolingMethod {
    /// Bilinear sampling averaged over each bin
    #[default]
    Align,
    /// Maximum over the cells of each bin
    Max,
}

/// Order of the levels in the caller's [`FeaturePyramid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum LevelOrder {
    /// Coarsest map first, finest last. The trailing entries are used.
    #[default]
    CoarseToFine,
    /// Finest map first. The leading entries are used.
    FineToCoarse,
}

/// Construction parameters for [`FpnROIAlign`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct FpnROIAlignConfig {
    /// Sampling points per bin axis; 0 picks it per region
    pub sampling_ratio: i32,
    /// Finest pyramid level regions may be assigned to
    pub min_level: usize,
    /// Coarsest pyramid level regions may be assigned to
    pub max_level: usize,
    /// Level a region of `canonical_size` pixels per side belongs to
    pub canonical_level: usize,
    pub canonical_size: f32,
    /// Output resolution for box heads
    pub box_resolution: usize,
    /// Output resolution for mask heads
    pub mask_resolution: usize,
    pub pooling: RoiPoolingMethod,
    pub level_order: LevelOrder,
}

impl Default for FpnROIAlignConfig {
    fn default() -> Self {
        Self {
            sampling_ratio: 0,
            min_level: 2,
            max_level: 5,
            canonical_level: 4,
            canonical_size: 224.0,
            box_resolution: 7,
            mask_resolution: 14,
            pooling: RoiPoolingMethod::Align,
            level_order: LevelOrder::CoarseToFine,
        }
    }
}

impl FpnROIAlignConfig {
    pub fn num_levels(&self) -> usize {
        self.max_level.saturating_sub(self.min_level) + 1
    }

    /// Output resolution for the box head, or the mask head when `is_mask`
    pub fn resolution(&self, is_mask: bool) -> usize {
        if is_mask {
            self.mask_resolution
        } else {
            self.box_resolution
        }
    }

    pub fn validate(&self) -> Result<()> {
        const OP: &str = "fpn_roi_align_config";
        if self.min_level > self.max_level {
            return Err(TensorError::invalid_argument_op(
                OP,
                &format!(
                    "min_level ({}) must not exceed max_level ({})",
                    self.min_level, self.max_level
                ),
            ));
        }
        if self.box_resolution == 0 || self.mask_resolution == 0 {
            return Err(TensorError::invalid_argument_op(
                OP,
                "box and mask resolutions must be positive",
            ));
        }
        if !self.canonical_size.is_finite() || self.canonical_size <= 0.0 {
            return Err(TensorError::invalid_argument_op(
                OP,
                &format!(
                    "canonical_size must be positive, got {}",
                    self.canonical_size
                ),
            ));
        }
        Ok(())
    }
}

/// RoI Align pooling for FPN feature maps.
///
/// The layer holds only its configuration; feature maps and regions are
/// supplied on every call.
#[derive(Debug, Clone, Default)]
pub struct FpnROIAlign {
    config: FpnROIAlignConfig,
}

impl FpnROIAlign {
    pub fn new(config: FpnROIAlignConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FpnROIAlignConfig {
        &self.config
    }

    /// Pool one fixed-size feature block per region.
    ///
    /// Returns `[num_rois, channels, R, R]` with `R` the mask resolution when
    /// `is_mask` is set and the box resolution otherwise. Row `i` belongs to
    /// region `i` and the output carries `rois`' LoD.
    pub fn forward<T>(
        &self,
        pyramid: &FeaturePyramid<T>,
        rois: &LodTensor<T>,
        is_mask: bool,
    ) -> Result<LodTensor<T>>
    where
        T: Float + FromPrimitive + Send + Sync,
    {
        let config = &self.config;
        let resolution = config.resolution(is_mask);
        let inputs = self.level_inputs(pyramid)?;
        tracing::debug!(
            num_rois = rois.rows(),
            resolution,
            levels = ?inputs.iter().map(|l| l.name()).collect::<Vec<_>>(),
            "fpn roi align"
        );

        let distribution = distribute_fpn_proposals(
            rois,
            config.min_level,
            config.max_level,
            config.canonical_level,
            config.canonical_size,
        )?;

        // Levels come back finest first, matching `inputs`
        let roi_out_list = distribution
            .multi_rois
            .iter()
            .zip(&inputs)
            .map(|(level_rois, level)| self.pool_level(level, level_rois, resolution))
            .collect::<Result<Vec<_>>>()?;

        let parts: Vec<&Tensor<T>> = roi_out_list.iter().collect();
        let roi_feat_shuffle = concat(&parts, 0)?;
        let roi_feat = gather(&roi_feat_shuffle, &distribution.restore_index, 0)?;
        lod_reset(roi_feat, rois)
    }

    fn pool_level<T>(
        &self,
        level: &PyramidLevel<T>,
        rois: &LodTensor<T>,
        resolution: usize,
    ) -> Result<Tensor<T>>
    where
        T: Float + FromPrimitive + Send + Sync,
    {
        let pooled_size = (resolution, resolution);
        match self.config.pooling {
            RoiPoolingMethod::Align => roi_align2d(
                level.feature(),
                rois,
                pooled_size,
                level.spatial_scale(),
                self.config.sampling_ratio,
            ),
            RoiPoolingMethod::Max => {
                roi_pool2d(level.feature(), rois, pooled_size, level.spatial_scale())
            }
        }
    }

    /// Pyramid entries for `min_level..=max_level`, finest first
    pub fn level_inputs<'a, T>(
        &self,
        pyramid: &'a FeaturePyramid<T>,
    ) -> Result<Vec<&'a PyramidLevel<T>>> {
        let num_levels = self.config.num_levels();
        let levels = pyramid.levels();
        if levels.len() < num_levels {
            return Err(TensorError::invalid_argument_op(
                "fpn_roi_align",
                &format!(
                    "levels {}..={} need {num_levels} feature maps, got {}",
                    self.config.min_level,
                    self.config.max_level,
                    levels.len()
                ),
            ));
        }

        let selected: Vec<&PyramidLevel<T>> = match self.config.level_order {
            LevelOrder::CoarseToFine => levels[levels.len() - num_levels..]
                .iter()
                .rev()
                .collect(),
            LevelOrder::FineToCoarse => levels[..num_levels].iter().collect(),
        };
        Ok(selected)
    }
}

impl<T> RoiExtractor<T> for FpnROIAlign
where
    T: Float + FromPrimitive + Send + Sync,
{
    fn extract(
        &self,
        pyramid: &FeaturePyramid<T>,
        rois: &LodTensor<T>,
        is_mask: bool,
    ) -> Result<LodTensor<T>> {
        self.forward(pyramid, rois, is_mask)
    }

    fn output_resolution(&self, is_mask: bool) -> (usize, usize) {
        let resolution = self.config.resolution(is_mask);
        (resolution, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roiflow_core::Lod;

    /// P5..P2 on a 64x64 image, coarsest first; every map is filled with its
    /// level number so pooled values reveal where a region was pooled from.
    fn pyramid(channels: usize) -> FeaturePyramid<f32> {
        let mut pyramid = FeaturePyramid::new();
        for level in (2..=5).rev() {
            let size = 64 >> level;
            pyramid.push(
                format!("p{level}"),
                Tensor::full(&[1, channels, size, size], level as f32),
                1.0 / (1 << level) as f32,
            );
        }
        pyramid
    }

    fn single_image_rois(boxes: Vec<f32>) -> LodTensor<f32> {
        let rows = boxes.len() / 4;
        LodTensor::single(Tensor::from_vec(boxes, &[rows, 4]).unwrap()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = FpnROIAlignConfig::default();
        assert_eq!(config.sampling_ratio, 0);
        assert_eq!((config.min_level, config.max_level), (2, 5));
        assert_eq!(config.canonical_level, 4);
        assert_eq!(config.canonical_size, 224.0);
        assert_eq!(config.resolution(false), 7);
        assert_eq!(config.resolution(true), 14);
        assert_eq!(config.num_levels(), 4);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let reversed = FpnROIAlignConfig {
            min_level: 5,
            max_level: 2,
            ..Default::default()
        };
        assert!(FpnROIAlign::new(reversed).is_err());

        let zero_mask = FpnROIAlignConfig {
            mask_resolution: 0,
            ..Default::default()
        };
        assert!(FpnROIAlign::new(zero_mask).is_err());

        let bad_size = FpnROIAlignConfig {
            canonical_size: f32::NAN,
            ..Default::default()
        };
        assert!(FpnROIAlign::new(bad_size).is_err());
    }

    #[test]
    fn test_level_inputs_coarse_to_fine() {
        let layer = FpnROIAlign::default();
        let names: Vec<_> = layer
            .level_inputs(&pyramid(1))
            .unwrap()
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        assert_eq!(names, vec!["p2", "p3", "p4", "p5"]);

        // Extra coarse maps in front are skipped
        let extended = FeaturePyramid::new()
            .with_level("p6", Tensor::<f32>::zeros(&[1, 1, 1, 1]), 1.0 / 64.0)
            .with_level("p5", Tensor::<f32>::zeros(&[1, 1, 2, 2]), 1.0 / 32.0)
            .with_level("p4", Tensor::<f32>::zeros(&[1, 1, 4, 4]), 1.0 / 16.0)
            .with_level("p3", Tensor::<f32>::zeros(&[1, 1, 8, 8]), 1.0 / 8.0)
            .with_level("p2", Tensor::<f32>::zeros(&[1, 1, 16, 16]), 1.0 / 4.0);
        let names: Vec<_> = layer
            .level_inputs(&extended)
            .unwrap()
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        assert_eq!(names, vec!["p2", "p3", "p4", "p5"]);
    }

    #[test]
    fn test_level_inputs_fine_to_coarse_ignores_extra_levels() {
        let layer = FpnROIAlign::new(FpnROIAlignConfig {
            level_order: LevelOrder::FineToCoarse,
            min_level: 2,
            max_level: 3,
            ..Default::default()
        })
        .unwrap();
        let pyramid = FeaturePyramid::new()
            .with_level("p2", Tensor::<f32>::zeros(&[1, 1, 4, 4]), 0.25)
            .with_level("p3", Tensor::<f32>::zeros(&[1, 1, 2, 2]), 0.125)
            .with_level("p4", Tensor::<f32>::zeros(&[1, 1, 1, 1]), 0.0625);
        let names: Vec<_> = layer
            .level_inputs(&pyramid)
            .unwrap()
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        assert_eq!(names, vec!["p2", "p3"]);
    }

    #[test]
    fn test_too_few_levels() {
        let layer = FpnROIAlign::default();
        let pyramid =
            FeaturePyramid::new().with_level("p2", Tensor::<f32>::zeros(&[1, 1, 4, 4]), 0.25);
        let rois = single_image_rois(vec![0.0, 0.0, 3.0, 3.0]);
        assert!(layer.forward(&pyramid, &rois, false).is_err());
    }

    #[test]
    fn test_regions_pool_from_their_level() {
        // Canonical size 32 at level 3 so small boxes fit the 64x64 image
        let layer = FpnROIAlign::new(FpnROIAlignConfig {
            canonical_level: 3,
            canonical_size: 32.0,
            box_resolution: 2,
            ..Default::default()
        })
        .unwrap();
        let rois = single_image_rois(vec![
            0.0, 0.0, 63.0, 63.0, // 64 px -> level 4
            8.0, 8.0, 23.0, 23.0, // 16 px -> level 2
            0.0, 0.0, 31.0, 31.0, // 32 px -> level 3
        ]);
        let out = layer.forward(&pyramid(2), &rois, false).unwrap();
        assert_eq!(out.tensor().shape().dims(), &[3, 2, 2, 2]);

        let values = out.tensor().to_vec();
        let row = 2 * 2 * 2;
        let expected = [4.0, 2.0, 3.0];
        for (roi, level) in expected.iter().enumerate() {
            for v in &values[roi * row..(roi + 1) * row] {
                assert!((v - level).abs() < 1e-6, "roi {roi}: {v} != {level}");
            }
        }
    }

    #[test]
    fn test_mask_resolution() {
        let layer = FpnROIAlign::default();
        let rois = single_image_rois(vec![0.0, 0.0, 20.0, 20.0, 4.0, 4.0, 60.0, 40.0]);
        let out = layer.forward(&pyramid(3), &rois, true).unwrap();
        assert_eq!(out.tensor().shape().dims(), &[2, 3, 14, 14]);
        assert_eq!(RoiExtractor::<f32>::output_resolution(&layer, true), (14, 14));
    }

    #[test]
    fn test_max_pooling_method() {
        let layer = FpnROIAlign::new(FpnROIAlignConfig {
            pooling: RoiPoolingMethod::Max,
            box_resolution: 2,
            ..Default::default()
        })
        .unwrap();
        let rois = LodTensor::new(
            Tensor::from_vec(vec![0.0, 0.0, 15.0, 15.0], &[1, 4]).unwrap(),
            Lod::from_lengths(&[1]),
        )
        .unwrap();
        let out = layer.forward(&pyramid(1), &rois, false).unwrap();
        // 16 px is far below the canonical size: pooled from P2
        assert!(out.tensor().to_vec().iter().all(|&v| v == 2.0));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: FpnROIAlignConfig = serde_json::from_str(
            r#"{ "min_level": 2, "max_level": 3, "pooling": "max", "level_order": "fine_to_coarse" }"#,
        )
        .unwrap();
        assert_eq!(config.max_level, 3);
        assert_eq!(config.box_resolution, 7);
        assert_eq!(config.pooling, RoiPoolingMethod::Max);
        assert_eq!(config.level_order, LevelOrder::FineToCoarse);

        let json = serde_json::to_string(&FpnROIAlignConfig::default()).unwrap();
        let back: FpnROIAlignConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FpnROIAlignConfig::default());
    }
}
