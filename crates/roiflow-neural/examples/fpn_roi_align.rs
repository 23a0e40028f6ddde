//! Pool box and mask features for a batch of two images.
//!
//! Run with `RUST_LOG=debug` to see the level assignment.

use roiflow_core::{Lod, LodTensor, Tensor};
use roiflow_neural::{FeaturePyramid, FpnROIAlign, FpnROIAlignConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (batch, channels) = (2, 16);
    let mut pyramid = FeaturePyramid::new();
    for level in [5u32, 4, 3, 2] {
        let size = 512 >> level;
        let stride = (1u32 << level) as f32;
        let data = (0..batch * channels * size * size)
            .map(|i| (i % size) as f32 * stride)
            .collect();
        pyramid.push(
            format!("fpn_res{level}_sum"),
            Tensor::from_vec(data, &[batch, channels, size, size])?,
            1.0 / stride,
        );
    }

    let rois = LodTensor::new(
        Tensor::from_vec(
            vec![
                8.0, 8.0, 40.0, 40.0, // image 0
                100.0, 60.0, 380.0, 300.0, // image 0
                0.0, 0.0, 511.0, 511.0, // image 1
            ],
            &[3, 4],
        )?,
        Lod::from_lengths(&[2, 1]),
    )?;

    let layer = FpnROIAlign::new(FpnROIAlignConfig::default())?;
    let boxes = layer.forward(&pyramid, &rois, false)?;
    let masks = layer.forward(&pyramid, &rois, true)?;

    println!("box features:  {}", boxes.tensor().shape());
    println!("mask features: {}", masks.tensor().shape());
    println!("per-image regions: {:?}", boxes.lod().lengths());
    Ok(())
}
