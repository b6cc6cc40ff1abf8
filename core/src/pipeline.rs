//! Report pipeline: per-slot detection, aggregation, classification, pages
//!
//! A run walks the slots in fixed order. Slots without an image are skipped.
//! A populated slot whose model is missing or fails aborts the whole run, so a
//! report is never produced with a silently missing page.

use crate::detection::{AnnotationStyle, ModelRegistry};
use crate::diagnosis::classify;
use crate::error::{OrthoscanError, Result};
use crate::findings::aggregate;
use crate::intake::CaseImages;
use crate::report::{Page, Report};
use crate::types::{AnatomicalSlot, Detection, ReportConfig};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Generates reports from stored case images with preloaded models
pub struct ReportPipeline<'a> {
    models: &'a ModelRegistry,
    style: AnnotationStyle,
    confidence_threshold: f32,
}

impl<'a> ReportPipeline<'a> {
    /// Creates a pipeline, loading the caption font named by `config`
    ///
    /// A font that cannot be loaded is logged and captions are dropped; boxes
    /// are still drawn.
    pub fn new(models: &'a ModelRegistry, config: &ReportConfig) -> Self {
        let style = match &config.font_path {
            Some(path) => AnnotationStyle::with_font_path(path).unwrap_or_else(|e| {
                warn!("Cannot load font {}: {}", path.display(), e);
                AnnotationStyle::default()
            }),
            None => AnnotationStyle::with_system_font(),
        };

        Self {
            models,
            style: style.box_thickness(config.box_thickness),
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Builder: Replace the overlay style
    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Runs detection on every populated slot and assembles the report
    ///
    /// # Errors
    ///
    /// Fails on the first slot whose image cannot be decoded, has no model,
    /// or whose model fails. No partial report is returned.
    pub fn generate_report(&self, images: &CaseImages) -> Result<Report> {
        let mut per_slot: HashMap<AnatomicalSlot, Vec<Detection>> = HashMap::new();
        let mut pages = Vec::new();

        for slot in AnatomicalSlot::ALL {
            let Some(stored) = images.get(&slot) else {
                info!("Skipping {}: no image uploaded", slot);
                continue;
            };

            let detector = self.models.detector_for(slot)?;
            let image = stored.decode()?;
            let detections = detector
                .detect(&image, self.confidence_threshold)
                .map_err(|e| into_detection_failure(slot, e))?;

            info!("Processed {}: {} detections", stored.key, detections.len());
            for detection in &detections {
                debug!("  {}", detection);
            }

            let annotated = detector.render_annotated(&image, &detections, &self.style);
            pages.push(Page::Annotated {
                slot,
                title: slot.page_title(),
                image: annotated,
            });
            per_slot.insert(slot, detections);
        }

        let findings = aggregate(&per_slot);
        let diagnosis = classify(&findings);
        info!(
            "Diagnosis from {} findings: {}",
            findings.len(),
            diagnosis.primary_class
        );

        Ok(Report::new(pages, diagnosis))
    }
}

fn into_detection_failure(slot: AnatomicalSlot, err: OrthoscanError) -> OrthoscanError {
    if err.is_detection_failure() {
        err
    } else {
        OrthoscanError::detection(slot, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detector, FixedDetector};
    use crate::intake::StoredImage;
    use crate::types::{BoundingBox, MalocclusionClass, ModelKind, SecondaryFinding};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&self, _image: &DynamicImage, _threshold: f32) -> Result<Vec<Detection>> {
            Err(OrthoscanError::InvalidValue("model exploded".to_string()))
        }
    }

    fn det(label: &str) -> Detection {
        Detection::new(label, 0.9, BoundingBox::new(2.0, 2.0, 12.0, 12.0))
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(24, 16))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn stored(slot: AnatomicalSlot, bytes: Vec<u8>) -> StoredImage {
        StoredImage {
            slot,
            key: format!("{}.png", slot),
            bytes,
        }
    }

    fn full_case() -> CaseImages {
        AnatomicalSlot::ALL
            .iter()
            .map(|slot| (*slot, stored(*slot, png_bytes())))
            .collect()
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with_model(
                ModelKind::Frontal,
                Box::new(FixedDetector::new(vec![det("Class III")])),
            )
            .with_model(
                ModelKind::Lateral,
                Box::new(FixedDetector::new(vec![det("Class II"), det("Deep Bite")])),
            )
            .with_model(
                ModelKind::Occlusal,
                Box::new(FixedDetector::new(vec![det("Spacing")])),
            )
    }

    fn pipeline(models: &ModelRegistry) -> ReportPipeline<'_> {
        ReportPipeline::new(models, &ReportConfig::default()).with_style(AnnotationStyle::default())
    }

    #[test]
    fn test_no_images_gives_summary_only() {
        let models = registry();
        let report = pipeline(&models).generate_report(&CaseImages::new()).unwrap();

        assert_eq!(report.page_count(), 1);
        assert!(report.pages()[0].is_summary());
        assert_eq!(report.diagnosis().primary_class, MalocclusionClass::ClassI);
        assert!(report.diagnosis().secondary_findings.is_empty());
    }

    #[test]
    fn test_full_case_gives_six_pages_in_slot_order() {
        let models = registry();
        let report = pipeline(&models).generate_report(&full_case()).unwrap();

        assert_eq!(report.page_count(), 6);
        assert_eq!(report.slots(), AnatomicalSlot::ALL.to_vec());
        assert!(report.pages()[5].is_summary());
        assert_eq!(report.pages()[1].title(), Some("Right_lateral Predictions"));

        let diagnosis = report.diagnosis();
        assert_eq!(diagnosis.primary_class, MalocclusionClass::ClassII);
        assert!(diagnosis.has(SecondaryFinding::DeepBite));
        assert!(diagnosis.has(SecondaryFinding::Spacing));
        assert!(!diagnosis.has(SecondaryFinding::OpenBite));
    }

    #[test]
    fn test_missing_slots_are_skipped() {
        let models = registry();
        let mut images = CaseImages::new();
        images.insert(
            AnatomicalSlot::LowerOcclusal,
            stored(AnatomicalSlot::LowerOcclusal, png_bytes()),
        );
        images.insert(
            AnatomicalSlot::Frontal,
            stored(AnatomicalSlot::Frontal, png_bytes()),
        );

        let report = pipeline(&models).generate_report(&images).unwrap();

        assert_eq!(
            report.slots(),
            vec![AnatomicalSlot::Frontal, AnatomicalSlot::LowerOcclusal]
        );
        assert_eq!(report.diagnosis().primary_class, MalocclusionClass::ClassIII);
    }

    #[test]
    fn test_annotated_page_keeps_image_size() {
        let models = registry();
        let report = pipeline(&models).generate_report(&full_case()).unwrap();

        match &report.pages()[0] {
            Page::Annotated { image, .. } => assert_eq!(image.dimensions(), (24, 16)),
            Page::Summary { .. } => panic!("expected annotated page"),
        }
    }

    #[test]
    fn test_detector_failure_aborts_run() {
        let models = registry().with_model(ModelKind::Occlusal, Box::new(FailingDetector));

        let err = pipeline(&models).generate_report(&full_case()).unwrap_err();
        match err {
            OrthoscanError::Detection { slot, message } => {
                assert_eq!(slot, AnatomicalSlot::UpperOcclusal);
                assert!(message.contains("model exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_model_aborts_run() {
        let models = ModelRegistry::new().with_model(
            ModelKind::Frontal,
            Box::new(FixedDetector::new(vec![det("Class II")])),
        );

        let err = pipeline(&models).generate_report(&full_case()).unwrap_err();
        assert!(matches!(
            err,
            OrthoscanError::ModelUnavailable(AnatomicalSlot::RightLateral)
        ));
    }

    #[test]
    fn test_undecodable_image_aborts_run() {
        let models = registry();
        let mut images = CaseImages::new();
        images.insert(
            AnatomicalSlot::Frontal,
            stored(AnatomicalSlot::Frontal, b"garbage".to_vec()),
        );

        let err = pipeline(&models).generate_report(&images).unwrap_err();
        assert!(matches!(err, OrthoscanError::ImageDecode { .. }));
    }

    #[test]
    fn test_confidence_threshold_is_forwarded() {
        let models = ModelRegistry::new().with_model(
            ModelKind::Frontal,
            Box::new(FixedDetector::new(vec![Detection::new(
                "Class II",
                0.3,
                BoundingBox::new(1.0, 1.0, 5.0, 5.0),
            )])),
        );
        let mut images = CaseImages::new();
        images.insert(
            AnatomicalSlot::Frontal,
            stored(AnatomicalSlot::Frontal, png_bytes()),
        );

        let strict = ReportConfig::default().with_confidence_threshold(0.5);
        let report = ReportPipeline::new(&models, &strict)
            .with_style(AnnotationStyle::default())
            .generate_report(&images)
            .unwrap();

        assert_eq!(report.diagnosis().primary_class, MalocclusionClass::ClassI);
        assert_eq!(report.page_count(), 2);
    }
}
