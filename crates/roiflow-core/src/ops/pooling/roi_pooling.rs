//! ROI (Region of Interest) pooling operations for object detection
//!
//! This module provides ROI pooling and ROI align operations commonly used
//! in object detection models like Fast R-CNN, Mask R-CNN and FPN heads.
//!
//! Both operators take feature maps `[batch, channels, height, width]` and
//! regions `[num_rois, 4]` given as `(x1, y1, x2, y2)` in input-image pixels,
//! grouped by image through the regions' LoD. Region `r` reads from the batch
//! item of the LoD sequence that owns it. Output is
//! `[num_rois, channels, pooled_height, pooled_width]`.

use crate::{LodTensor, Result, Tensor, TensorError};
use num_traits::{Float, FromPrimitive};
use rayon::prelude::*;

/// Validated geometry shared by both kernels
struct RoiGeometry {
    channels: usize,
    height: usize,
    width: usize,
    num_rois: usize,
}

/// ROI max pooling.
///
/// Region corners are scaled by `spatial_scale` and rounded to the nearest
/// cell. Each output bin takes the maximum over its cells; bins that fall
/// entirely outside the feature map are 0.
pub fn roi_pool2d<T>(
    feature_maps: &Tensor<T>,
    rois: &LodTensor<T>,
    pooled_size: (usize, usize),
    spatial_scale: f32,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let geometry = validate_inputs("roi_pool2d", feature_maps, rois, pooled_size)?;
    tracing::trace!(
        num_rois = geometry.num_rois,
        channels = geometry.channels,
        ?pooled_size,
        spatial_scale,
        "roi_pool2d"
    );
    roi_pool2d_cpu(feature_maps, rois, &geometry, pooled_size, spatial_scale)
}

/// ROI Align pooling operation (improved version of ROI pooling).
///
/// Uses bilinear interpolation at `sampling_ratio x sampling_ratio` regularly
/// spaced points per bin and averages them. A non-positive `sampling_ratio`
/// picks `ceil(roi_size / pooled_size)` points per axis for each region.
pub fn roi_align2d<T>(
    feature_maps: &Tensor<T>,
    rois: &LodTensor<T>,
    pooled_size: (usize, usize),
    spatial_scale: f32,
    sampling_ratio: i32,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let geometry = validate_inputs("roi_align2d", feature_maps, rois, pooled_size)?;
    tracing::trace!(
        num_rois = geometry.num_rois,
        channels = geometry.channels,
        ?pooled_size,
        spatial_scale,
        sampling_ratio,
        "roi_align2d"
    );
    roi_align2d_cpu(
        feature_maps,
        rois,
        &geometry,
        pooled_size,
        spatial_scale,
        sampling_ratio,
    )
}

fn validate_inputs<T>(
    operation: &str,
    feature_maps: &Tensor<T>,
    rois: &LodTensor<T>,
    pooled_size: (usize, usize),
) -> Result<RoiGeometry> {
    let feature_dims = feature_maps.shape().dims();
    let roi_dims = rois.tensor().shape().dims();

    if feature_dims.len() != 4 {
        return Err(TensorError::invalid_shape(
            operation,
            &format!("feature maps must be 4D, got {}D", feature_dims.len()),
            feature_dims,
        ));
    }

    if roi_dims.len() != 2 || roi_dims[1] != 4 {
        return Err(TensorError::invalid_shape(
            operation,
            "ROIs must be [num_rois, 4]",
            roi_dims,
        ));
    }

    if pooled_size.0 == 0 || pooled_size.1 == 0 {
        return Err(TensorError::invalid_argument_op(
            operation,
            &format!("pooled size must be positive, got {pooled_size:?}"),
        ));
    }

    let batch_size = feature_dims[0];
    if rois.lod().num_sequences() != batch_size {
        return Err(TensorError::lod_mismatch(
            operation,
            &format!(
                "ROIs are grouped into {} images but the feature batch has {batch_size}",
                rois.lod().num_sequences()
            ),
        ));
    }

    Ok(RoiGeometry {
        channels: feature_dims[1],
        height: feature_dims[2],
        width: feature_dims[3],
        num_rois: roi_dims[0],
    })
}

fn contiguous<'a, T>(operation: &str, tensor: &'a Tensor<T>) -> Result<&'a [T]> {
    tensor
        .as_slice()
        .ok_or_else(|| TensorError::invalid_argument_op(operation, "tensor is not contiguous"))
}

fn to_f64<T: Float>(value: T) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

// CPU implementations

fn roi_pool2d_cpu<T>(
    feature_maps: &Tensor<T>,
    rois: &LodTensor<T>,
    geometry: &RoiGeometry,
    pooled_size: (usize, usize),
    spatial_scale: f32,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let features = contiguous("roi_pool2d", feature_maps)?;
    let boxes = contiguous("roi_pool2d", rois.tensor())?;
    let batch_ids = rois.lod().sequence_ids();

    let RoiGeometry {
        channels,
        height,
        width,
        num_rois,
    } = *geometry;
    let (pooled_height, pooled_width) = pooled_size;
    let roi_stride = channels * pooled_height * pooled_width;
    let spatial_scale = spatial_scale as f64;

    let mut output_data = vec![T::zero(); num_rois * roi_stride];
    if roi_stride == 0 {
        return Tensor::from_vec(
            output_data,
            &[num_rois, channels, pooled_height, pooled_width],
        );
    }

    output_data
        .par_chunks_mut(roi_stride)
        .enumerate()
        .for_each(|(roi_idx, roi_out)| {
            let bbox = &boxes[roi_idx * 4..roi_idx * 4 + 4];
            let batch_idx = batch_ids[roi_idx];

            let roi_start_w = (to_f64(bbox[0]) * spatial_scale).round() as i64;
            let roi_start_h = (to_f64(bbox[1]) * spatial_scale).round() as i64;
            let roi_end_w = (to_f64(bbox[2]) * spatial_scale).round() as i64;
            let roi_end_h = (to_f64(bbox[3]) * spatial_scale).round() as i64;

            // Malformed regions are forced to 1x1
            let roi_height = roi_end_h.saturating_sub(roi_start_h).saturating_add(1).max(1);
            let roi_width = roi_end_w.saturating_sub(roi_start_w).saturating_add(1).max(1);

            let bin_size_h = roi_height as f64 / pooled_height as f64;
            let bin_size_w = roi_width as f64 / pooled_width as f64;

            let clamp_h = |v: i64| v.clamp(0, height as i64) as usize;
            let clamp_w = |v: i64| v.clamp(0, width as i64) as usize;
            let bin_edge = |offset: f64, start: i64| (offset as i64).saturating_add(start);

            for c in 0..channels {
                let plane = &features[(batch_idx * channels + c) * height * width..]
                    [..height * width];
                for ph in 0..pooled_height {
                    let hstart = clamp_h(bin_edge((ph as f64 * bin_size_h).floor(), roi_start_h));
                    let hend =
                        clamp_h(bin_edge(((ph + 1) as f64 * bin_size_h).ceil(), roi_start_h));
                    for pw in 0..pooled_width {
                        let wstart =
                            clamp_w(bin_edge((pw as f64 * bin_size_w).floor(), roi_start_w));
                        let wend =
                            clamp_w(bin_edge(((pw + 1) as f64 * bin_size_w).ceil(), roi_start_w));

                        let mut max_val: Option<T> = None;
                        for h in hstart..hend {
                            for &val in &plane[h * width + wstart..h * width + wend] {
                                max_val = match max_val {
                                    Some(current) if current >= val => Some(current),
                                    _ => Some(val),
                                };
                            }
                        }

                        roi_out[(c * pooled_height + ph) * pooled_width + pw] =
                            max_val.unwrap_or_else(T::zero);
                    }
                }
            }
        });

    Tensor::from_vec(
        output_data,
        &[num_rois, channels, pooled_height, pooled_width],
    )
}

fn roi_align2d_cpu<T>(
    feature_maps: &Tensor<T>,
    rois: &LodTensor<T>,
    geometry: &RoiGeometry,
    pooled_size: (usize, usize),
    spatial_scale: f32,
    sampling_ratio: i32,
) -> Result<Tensor<T>>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let features = contiguous("roi_align2d", feature_maps)?;
    let boxes = contiguous("roi_align2d", rois.tensor())?;
    let batch_ids = rois.lod().sequence_ids();

    let RoiGeometry {
        channels,
        height,
        width,
        num_rois,
    } = *geometry;
    let (pooled_height, pooled_width) = pooled_size;
    let roi_stride = channels * pooled_height * pooled_width;
    let spatial_scale = spatial_scale as f64;

    let mut output_data = vec![T::zero(); num_rois * roi_stride];
    if roi_stride == 0 {
        return Tensor::from_vec(
            output_data,
            &[num_rois, channels, pooled_height, pooled_width],
        );
    }

    output_data
        .par_chunks_mut(roi_stride)
        .enumerate()
        .for_each(|(roi_idx, roi_out)| {
            let bbox = &boxes[roi_idx * 4..roi_idx * 4 + 4];
            let batch_idx = batch_ids[roi_idx];

            let roi_x1 = to_f64(bbox[0]) * spatial_scale;
            let roi_y1 = to_f64(bbox[1]) * spatial_scale;
            let roi_x2 = to_f64(bbox[2]) * spatial_scale;
            let roi_y2 = to_f64(bbox[3]) * spatial_scale;

            // Malformed regions are forced to 1x1
            let roi_width = (roi_x2 - roi_x1).max(1.0);
            let roi_height = (roi_y2 - roi_y1).max(1.0);

            let bin_size_h = roi_height / pooled_height as f64;
            let bin_size_w = roi_width / pooled_width as f64;

            let roi_bin_grid_h = if sampling_ratio > 0 {
                sampling_ratio as usize
            } else {
                bin_size_h.ceil() as usize
            };
            let roi_bin_grid_w = if sampling_ratio > 0 {
                sampling_ratio as usize
            } else {
                bin_size_w.ceil() as usize
            };
            let count = (roi_bin_grid_h * roi_bin_grid_w).max(1) as f64;

            // One weight lookup per sample, applied to every channel
            let plane_size = height * width;
            let num_bins = pooled_height * pooled_width;
            let batch_offset = batch_idx * channels * plane_size;
            let mut sums = vec![0.0f64; channels];
            for ph in 0..pooled_height {
                for pw in 0..pooled_width {
                    sums.fill(0.0);
                    for iy in 0..roi_bin_grid_h {
                        let y = roi_y1
                            + ph as f64 * bin_size_h
                            + (iy as f64 + 0.5) * bin_size_h / roi_bin_grid_h as f64;
                        for ix in 0..roi_bin_grid_w {
                            let x = roi_x1
                                + pw as f64 * bin_size_w
                                + (ix as f64 + 0.5) * bin_size_w / roi_bin_grid_w as f64;
                            let Some(sample) = bilinear_weights(y, x, height, width) else {
                                continue;
                            };
                            for (c, sum) in sums.iter_mut().enumerate() {
                                let start = batch_offset + c * plane_size;
                                let plane = &features[start..start + plane_size];
                                *sum += sample.interpolate(plane, width);
                            }
                        }
                    }

                    let bin = ph * pooled_width + pw;
                    for (c, sum) in sums.iter().enumerate() {
                        roi_out[c * num_bins + bin] =
                            T::from_f64(sum / count).unwrap_or_else(T::zero);
                    }
                }
            }
        });

    Tensor::from_vec(
        output_data,
        &[num_rois, channels, pooled_height, pooled_width],
    )
}

/// Four neighbouring cells and their bilinear weights
#[derive(Debug, Clone, Copy, PartialEq)]
struct BilinearSample {
    y_low: usize,
    y_high: usize,
    x_low: usize,
    x_high: usize,
    w1: f64,
    w2: f64,
    w3: f64,
    w4: f64,
}

impl BilinearSample {
    fn interpolate<T: Float>(&self, plane: &[T], width: usize) -> f64 {
        let at = |y: usize, x: usize| to_f64(plane[y * width + x]);
        self.w1 * at(self.y_low, self.x_low)
            + self.w2 * at(self.y_low, self.x_high)
            + self.w3 * at(self.y_high, self.x_low)
            + self.w4 * at(self.y_high, self.x_high)
    }
}

/// Bilinear interpolation weights for ROI Align.
///
/// Points more than one cell outside the map contribute nothing; points
/// within that margin are clamped to the border.
fn bilinear_weights(y: f64, x: f64, height: usize, width: usize) -> Option<BilinearSample> {
    if height == 0 || width == 0 {
        return None;
    }
    if y < -1.0 || y > height as f64 || x < -1.0 || x > width as f64 {
        return None;
    }

    let mut y = y.max(0.0);
    let mut x = x.max(0.0);

    let mut y_low = y as usize;
    let y_high;
    if y_low >= height - 1 {
        y_low = height - 1;
        y_high = height - 1;
        y = y_low as f64;
    } else {
        y_high = y_low + 1;
    }

    let mut x_low = x as usize;
    let x_high;
    if x_low >= width - 1 {
        x_low = width - 1;
        x_high = width - 1;
        x = x_low as f64;
    } else {
        x_high = x_low + 1;
    }

    let ly = y - y_low as f64;
    let lx = x - x_low as f64;
    let hy = 1.0 - ly;
    let hx = 1.0 - lx;

    Some(BilinearSample {
        y_low,
        y_high,
        x_low,
        x_high,
        w1: hy * hx,
        w2: hy * lx,
        w3: ly * hx,
        w4: ly * lx,
    })
}
