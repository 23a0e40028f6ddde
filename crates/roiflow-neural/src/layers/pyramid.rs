//! Feature pyramid inputs for RoI extraction

use roiflow_core::{Result, Tensor, TensorError};

/// One named level of a feature pyramid
#[derive(Debug, Clone)]
pub struct PyramidLevel<T> {
    name: String,
    feature: Tensor<T>,
    spatial_scale: f32,
}

impl<T> PyramidLevel<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature map, `[batch, channels, height, width]`
    pub fn feature(&self) -> &Tensor<T> {
        &self.feature
    }

    /// Ratio of this level's resolution to the input image, e.g. `1/4` for P2
    pub fn spatial_scale(&self) -> f32 {
        self.spatial_scale
    }
}

/// Ordered collection of feature maps produced by a backbone/FPN.
///
/// Levels keep insertion order. Extractors decide how that order maps onto
/// pyramid levels (see [`LevelOrder`](super::pooling::LevelOrder)).
#[derive(Debug, Clone)]
pub struct FeaturePyramid<T> {
    levels: Vec<PyramidLevel<T>>,
}

impl<T> Default for FeaturePyramid<T> {
    fn default() -> Self {
        Self { levels: Vec::new() }
    }
}

impl<T> FeaturePyramid<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from named feature maps and a parallel list of spatial scales
    pub fn from_parts(features: Vec<(String, Tensor<T>)>, spatial_scales: &[f32]) -> Result<Self> {
        if features.len() != spatial_scales.len() {
            return Err(TensorError::shape_mismatch(
                "feature_pyramid",
                &format!("{} spatial scales", features.len()),
                &format!("{} spatial scales", spatial_scales.len()),
            ));
        }
        let mut pyramid = Self::new();
        for ((name, feature), &scale) in features.into_iter().zip(spatial_scales) {
            pyramid.push(name, feature, scale);
        }
        Ok(pyramid)
    }

    pub fn push(&mut self, name: impl Into<String>, feature: Tensor<T>, spatial_scale: f32) {
        self.levels.push(PyramidLevel {
            name: name.into(),
            feature,
            spatial_scale,
        });
    }

    /// Builder-style [`push`](Self::push)
    pub fn with_level(
        mut self,
        name: impl Into<String>,
        feature: Tensor<T>,
        spatial_scale: f32,
    ) -> Self {
        self.push(name, feature, spatial_scale);
        self
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[PyramidLevel<T>] {
        &self.levels
    }

    pub fn get(&self, name: &str) -> Option<&PyramidLevel<T>> {
        self.levels.iter().find(|level| level.name == name)
    }

    /// Most recently inserted level
    pub fn last(&self) -> Option<&PyramidLevel<T>> {
        self.levels.last()
    }

    pub fn names(&self) -> Vec<&str> {
        self.levels.iter().map(|level| level.name.as_str()).collect()
    }
}
