use roiflow_core::{Lod, LodTensor, Result, Tensor};
use roiflow_neural::layers::{
    FeaturePyramid, FpnROIAlign, FpnROIAlignConfig, ROIAlign2D, ROIPool2D, RoiExtractor,
};

/// Feature map whose channel 0 holds the image x coordinate of each cell and
/// channel 1 the image y coordinate, plus `offset` per batch item.
fn coordinate_map(batch: usize, size: usize, stride: usize) -> Tensor<f32> {
    let mut data = Vec::with_capacity(batch * 2 * size * size);
    for b in 0..batch {
        let offset = 1000.0 * b as f32;
        for channel in 0..2 {
            for h in 0..size {
                for w in 0..size {
                    let coord = if channel == 0 { w } else { h };
                    data.push((coord * stride) as f32 + offset);
                }
            }
        }
    }
    Tensor::from_vec(data, &[batch, 2, size, size]).unwrap()
}

/// P3 then P2 for a 128x128 image
fn two_level_pyramid(batch: usize) -> FeaturePyramid<f32> {
    FeaturePyramid::from_parts(
        vec![
            ("fpn_p3".to_string(), coordinate_map(batch, 16, 8)),
            ("fpn_p2".to_string(), coordinate_map(batch, 32, 4)),
        ],
        &[1.0 / 8.0, 1.0 / 4.0],
    )
    .unwrap()
}

fn two_level_layer() -> FpnROIAlign {
    FpnROIAlign::new(FpnROIAlignConfig {
        min_level: 2,
        max_level: 3,
        canonical_level: 4,
        canonical_size: 224.0,
        ..Default::default()
    })
    .unwrap()
}

const BOXES: [[f32; 4]; 5] = [
    [8.0, 8.0, 40.0, 30.0],     // small -> P2
    [0.0, 0.0, 119.0, 119.0],   // 120 px -> P3
    [50.0, 20.0, 70.0, 60.0],   // small -> P2
    [4.0, 2.0, 117.0, 118.0],   // ~115 px -> P3
    [30.0, 70.0, 50.0, 100.0],  // small -> P2
];

fn rois(lengths: &[usize]) -> LodTensor<f32> {
    let data = BOXES.iter().flatten().copied().collect();
    LodTensor::new(
        Tensor::from_vec(data, &[BOXES.len(), 4]).unwrap(),
        Lod::from_lengths(lengths),
    )
    .unwrap()
}

fn channel_mean(values: &[f32], roi: usize, channel: usize, resolution: usize) -> f32 {
    let plane = resolution * resolution;
    let start = (roi * 2 + channel) * plane;
    values[start..start + plane].iter().sum::<f32>() / plane as f32
}

#[test]
fn test_two_levels_five_regions_end_to_end() -> Result<()> {
    let layer = two_level_layer();
    let rois = rois(&[5]);
    let out = layer.forward(&two_level_pyramid(1), &rois, false)?;

    assert_eq!(out.tensor().shape().dims(), &[5, 2, 7, 7]);
    assert_eq!(out.lod(), rois.lod());

    // Averaging a coordinate ramp over a region yields the region centre, so
    // row i must describe box i.
    let values = out.tensor().to_vec();
    for (i, b) in BOXES.iter().enumerate() {
        let cx = (b[0] + b[2]) / 2.0;
        let cy = (b[1] + b[3]) / 2.0;
        assert!((channel_mean(&values, i, 0, 7) - cx).abs() < 1e-2, "roi {i} x");
        assert!((channel_mean(&values, i, 1, 7) - cy).abs() < 1e-2, "roi {i} y");
    }
    Ok(())
}

#[test]
fn test_mask_flag_selects_mask_resolution() -> Result<()> {
    let layer = two_level_layer();
    let rois = rois(&[5]);
    let boxes = layer.forward(&two_level_pyramid(1), &rois, false)?;
    let masks = layer.forward(&two_level_pyramid(1), &rois, true)?;
    assert_eq!(boxes.tensor().shape().dims(), &[5, 2, 7, 7]);
    assert_eq!(masks.tensor().shape().dims(), &[5, 2, 14, 14]);
    Ok(())
}

#[test]
fn test_batch_grouping_is_preserved() -> Result<()> {
    let layer = two_level_layer();
    let rois = rois(&[2, 3]);
    let out = layer.forward(&two_level_pyramid(2), &rois, false)?;

    assert_eq!(out.lod().lengths(), vec![2, 3]);
    let values = out.tensor().to_vec();
    for (i, b) in BOXES.iter().enumerate() {
        let offset = if i < 2 { 0.0 } else { 1000.0 };
        let cx = (b[0] + b[2]) / 2.0 + offset;
        assert!((channel_mean(&values, i, 0, 7) - cx).abs() < 1e-2, "roi {i}");
    }
    Ok(())
}

#[test]
fn test_empty_region_set() -> Result<()> {
    let layer = FpnROIAlign::default();
    let mut pyramid = FeaturePyramid::new();
    for (name, size) in [("p5", 4), ("p4", 8), ("p3", 16), ("p2", 32)] {
        pyramid.push(name, Tensor::<f32>::zeros(&[1, 8, size, size]), 4.0 / size as f32);
    }
    let rois = LodTensor::single(Tensor::<f32>::zeros(&[0, 4]))?;
    let out = layer.forward(&pyramid, &rois, false)?;
    assert_eq!(out.tensor().shape().dims(), &[0, 8, 7, 7]);
    Ok(())
}

#[test]
fn test_mismatched_batch_propagates_error() {
    let layer = two_level_layer();
    // Regions claim two images, feature maps hold one
    let result = layer.forward(&two_level_pyramid(1), &rois(&[2, 3]), false);
    assert!(result.is_err());
}

#[test]
fn test_extractors_are_interchangeable() -> Result<()> {
    let extractors: Vec<Box<dyn RoiExtractor<f32>>> = vec![
        Box::new(two_level_layer()),
        Box::new(ROIAlign2D::square(7, 0.25, 2)),
        Box::new(ROIPool2D::square(7, 0.25)),
    ];
    let pyramid = two_level_pyramid(1);
    let rois = rois(&[5]);
    for extractor in &extractors {
        let out = extractor.extract(&pyramid, &rois, false)?;
        let (h, w) = extractor.output_resolution(false);
        assert_eq!(out.tensor().shape().dims(), &[5, 2, h, w]);
        assert_eq!(out.lod(), rois.lod());
    }
    Ok(())
}
