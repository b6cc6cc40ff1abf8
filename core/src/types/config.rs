use crate::types::ModelKind;
use std::path::{Path, PathBuf};

/// Default detector confidence threshold
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// Default file name of the generated report
pub const DEFAULT_REPORT_FILE_NAME: &str = "Annotated_Orthodontic_Images.pdf";

/// Configuration for report generation
///
/// # Example
///
/// ```
/// use orthoscan_core::ReportConfig;
///
/// let config = ReportConfig::default()
///     .with_confidence_threshold(0.4)
///     .with_box_thickness(3);
///
/// assert_eq!(config.confidence_threshold, 0.4);
/// assert_eq!(config.box_thickness, 3);
/// assert_eq!(config.image_extensions, vec!["jpg", "jpeg", "png"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct ReportConfig {
    /// Minimum confidence a detection needs to be kept by the detector
    pub confidence_threshold: f32,

    /// Extensions searched, in order, when loading `<slot>.<ext>`
    pub image_extensions: Vec<String>,

    /// File name of the stored report inside its case directory
    pub report_file_name: String,

    /// Font used for overlay captions. System fonts are tried when unset.
    pub font_path: Option<PathBuf>,

    /// Line thickness of overlay boxes in pixels
    pub box_thickness: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            image_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            report_file_name: DEFAULT_REPORT_FILE_NAME.to_string(),
            font_path: None,
            box_thickness: 2,
        }
    }
}

impl ReportConfig {
    /// Builder: Set the detector confidence threshold (clamped to `[0, 1]`)
    ///
    /// A non-finite threshold falls back to [`DEFAULT_CONFIDENCE`].
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            DEFAULT_CONFIDENCE
        };
        self
    }

    /// Builder: Set the searched image extensions
    pub fn with_image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set the report file name
    pub fn with_report_file_name(mut self, name: impl Into<String>) -> Self {
        self.report_file_name = name.into();
        self
    }

    /// Builder: Set the caption font
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Builder: Set the overlay box thickness
    pub fn with_box_thickness(mut self, thickness: u32) -> Self {
        self.box_thickness = thickness.max(1);
        self
    }
}

/// Locations of the detection models on disk
///
/// Each model is accompanied by a class-name file next to it, with the
/// same stem and a `.labels` extension, one class name per line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelPaths {
    pub frontal: PathBuf,
    pub lateral: PathBuf,
    pub occlusal: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            frontal: PathBuf::from("ORTHO-AI/FRONTAL AI/FRONTAL AI.onnx"),
            lateral: PathBuf::from("ORTHO-AI/LATERAL AI MODEL/LATERAL.onnx"),
            occlusal: PathBuf::from("ORTHO-AI/OCCLUSAL AI/occlusal.onnx"),
        }
    }
}

impl ModelPaths {
    /// Model file for a model kind
    pub fn model_path(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::Frontal => &self.frontal,
            ModelKind::Lateral => &self.lateral,
            ModelKind::Occlusal => &self.occlusal,
        }
    }

    /// Class-name file for a model kind
    pub fn labels_path(&self, kind: ModelKind) -> PathBuf {
        self.model_path(kind).with_extension("labels")
    }

    /// Resolves relative paths against `base`
    pub fn relative_to(&self, base: &Path) -> Self {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            frontal: resolve(&self.frontal),
            lateral: resolve(&self.lateral),
            occlusal: resolve(&self.occlusal),
        }
    }
}
