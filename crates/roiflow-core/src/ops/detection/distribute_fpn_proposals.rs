//! Assignment of regions of interest to feature-pyramid levels
//!
//! Each region goes to the level whose resolution best matches its scale:
//!
//! ```text
//! level = floor(log2(sqrt(area) / refer_scale + 1e-6) + refer_level)
//! ```
//!
//! clamped to `[min_level, max_level]`. A region of exactly `refer_scale`
//! pixels per side therefore lands on `refer_level`, larger regions go to
//! coarser levels and smaller ones to finer levels.

use super::box_utils::bbox_area;
use crate::{Lod, LodTensor, Result, Tensor, TensorError};
use num_traits::Float;

const LEVEL_EPSILON: f64 = 1e-6;

/// Regions split by pyramid level, plus the index that undoes the split
#[derive(Debug, Clone)]
pub struct FpnDistribution<T> {
    /// One entry per level, `min_level` first. Each holds that level's boxes
    /// grouped by image with one LoD sequence per input image.
    pub multi_rois: Vec<LodTensor<T>>,
    /// `[N, 1]`: row of region `i` within the level-ordered concatenation of
    /// `multi_rois`
    pub restore_index: Tensor<i32>,
}

impl<T> FpnDistribution<T> {
    pub fn num_levels(&self) -> usize {
        self.multi_rois.len()
    }

    /// Number of regions assigned to each level
    pub fn level_counts(&self) -> Vec<usize> {
        self.multi_rois.iter().map(|r| r.rows()).collect()
    }
}

/// Pyramid level for a region of the given scale (square root of its area)
pub fn fpn_target_level(
    scale: f64,
    min_level: usize,
    max_level: usize,
    refer_level: usize,
    refer_scale: f64,
) -> usize {
    let level = ((scale / refer_scale + LEVEL_EPSILON).log2() + refer_level as f64).floor();
    if level.is_nan() || level <= min_level as f64 {
        min_level
    } else if level >= max_level as f64 {
        max_level
    } else {
        level as usize
    }
}

/// Distribute `rois` (`[N, 4]` boxes with per-image LoD) over the pyramid
/// levels `min_level..=max_level`.
pub fn distribute_fpn_proposals<T>(
    rois: &LodTensor<T>,
    min_level: usize,
    max_level: usize,
    refer_level: usize,
    refer_scale: f32,
) -> Result<FpnDistribution<T>>
where
    T: Float,
{
    const OP: &str = "distribute_fpn_proposals";

    if min_level > max_level {
        return Err(TensorError::invalid_argument_op(
            OP,
            &format!("min_level ({min_level}) must not exceed max_level ({max_level})"),
        ));
    }
    if refer_scale.is_nan() || refer_scale <= 0.0 {
        return Err(TensorError::invalid_argument_op(
            OP,
            &format!("refer_scale must be positive, got {refer_scale}"),
        ));
    }
    let dims = rois.tensor().shape().dims();
    if dims.len() != 2 || dims[1] != 4 {
        return Err(TensorError::invalid_shape(
            OP,
            "rois must be [num_rois, 4]",
            dims,
        ));
    }

    let boxes = rois
        .tensor()
        .as_slice()
        .ok_or_else(|| TensorError::invalid_argument_op(OP, "rois tensor is not contiguous"))?;
    let num_levels = max_level - min_level + 1;
    let lod = rois.lod();

    let levels: Vec<usize> = boxes
        .chunks_exact(4)
        .map(|bbox| {
            let scale = bbox_area(bbox, false).sqrt().to_f64().unwrap_or(0.0);
            fpn_target_level(
                scale,
                min_level,
                max_level,
                refer_level,
                refer_scale as f64,
            ) - min_level
        })
        .collect();

    let mut restore_index = vec![0i32; levels.len()];
    let mut multi_rois = Vec::with_capacity(num_levels);
    let mut position = 0usize;

    for level in 0..num_levels {
        let mut level_boxes = Vec::new();
        let mut lengths = Vec::with_capacity(lod.num_sequences());

        for image in 0..lod.num_sequences() {
            let mut count = 0;
            for roi in lod.sequence_range(image).unwrap_or(0..0) {
                if levels[roi] != level {
                    continue;
                }
                level_boxes.extend_from_slice(&boxes[roi * 4..roi * 4 + 4]);
                restore_index[roi] = i32::try_from(position).map_err(|_| {
                    TensorError::invalid_argument_op(OP, "too many regions for an i32 index")
                })?;
                position += 1;
                count += 1;
            }
            lengths.push(count);
        }

        let rows = level_boxes.len() / 4;
        let tensor = Tensor::from_vec(level_boxes, &[rows, 4])?;
        multi_rois.push(LodTensor::new(tensor, Lod::from_lengths(&lengths))?);
    }

    let num_rois = restore_index.len();
    let distribution = FpnDistribution {
        multi_rois,
        restore_index: Tensor::from_vec(restore_index, &[num_rois, 1])?,
    };
    tracing::debug!(
        num_rois,
        min_level,
        max_level,
        counts = ?distribution.level_counts(),
        "distributed proposals over pyramid levels"
    );
    Ok(distribution)
}
