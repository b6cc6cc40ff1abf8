//! Detection collaborator interface
//!
//! Detection models are opaque: an image goes in, labelled boxes come out.
//! Models are loaded once into a [`ModelRegistry`] and shared by reference
//! with every report run.

pub mod annotate;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod yolo;

pub use annotate::{render_annotated, AnnotationStyle};
#[cfg(feature = "onnx")]
pub use onnx::OnnxDetector;

use crate::error::{OrthoscanError, Result};
use crate::types::{AnatomicalSlot, Detection, ModelKind};
use image::{DynamicImage, RgbImage};
use std::collections::HashMap;

/// An object-detection model
pub trait Detector {
    /// Runs the model, keeping detections with `confidence >= threshold`
    fn detect(&self, image: &DynamicImage, threshold: f32) -> Result<Vec<Detection>>;

    /// Draws `detections` over a copy of `image`
    fn render_annotated(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        style: &AnnotationStyle,
    ) -> RgbImage {
        render_annotated(image, detections, style)
    }
}

/// Detection models keyed by model kind
///
/// Slots sharing a [`ModelKind`] share the same loaded model.
#[derive(Default)]
pub struct ModelRegistry {
    models: HashMap<ModelKind, Box<dyn Detector>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model, replacing any previous one of the same kind
    pub fn insert(&mut self, kind: ModelKind, detector: Box<dyn Detector>) {
        self.models.insert(kind, detector);
    }

    /// Builder: Register a model
    pub fn with_model(mut self, kind: ModelKind, detector: Box<dyn Detector>) -> Self {
        self.insert(kind, detector);
        self
    }

    /// Returns the model configured for `slot`
    ///
    /// # Errors
    ///
    /// Returns [`OrthoscanError::ModelUnavailable`] when no model of the
    /// slot's kind was registered.
    pub fn detector_for(&self, slot: AnatomicalSlot) -> Result<&dyn Detector> {
        self.models
            .get(&slot.model_kind())
            .map(|d| d.as_ref())
            .ok_or(OrthoscanError::ModelUnavailable(slot))
    }

    pub fn contains(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Loads every ONNX model listed in `paths`
    #[cfg(feature = "onnx")]
    pub fn load_onnx(paths: &crate::types::ModelPaths) -> Result<Self> {
        let mut registry = Self::new();
        for kind in ModelKind::ALL {
            let detector = OnnxDetector::from_files(paths.model_path(kind), paths.labels_path(kind))?;
            log::info!("Loaded {} model: {}", kind, paths.model_path(kind).display());
            registry.insert(kind, Box::new(detector));
        }
        Ok(registry)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.models.keys().map(|k| k.simple_name()).collect();
        kinds.sort_unstable();
        f.debug_struct("ModelRegistry").field("models", &kinds).finish()
    }
}

/// Detector returning the same detections for any image
///
/// Confidence filtering still applies.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector {
    detections: Vec<Detection>,
}

impl FixedDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl Detector for FixedDetector {
    fn detect(&self, _image: &DynamicImage, threshold: f32) -> Result<Vec<Detection>> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= threshold)
            .cloned()
            .collect())
    }
}
