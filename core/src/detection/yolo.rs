//! Post-processing for YOLOv8-style detection heads
//!
//! The raw head output has shape `[1, 4 + classes, anchors]`: rows 0..4 hold
//! the box centre and size in model-input pixels, the remaining rows hold one
//! score per class.

use crate::error::{OrthoscanError, Result};
use crate::types::{BoundingBox, Detection};
use std::cmp::Ordering;

/// IoU above which a lower-scoring box of the same class is suppressed
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Decodes a raw head output into detections in source-image pixels
///
/// `scale` maps model-input coordinates to source coordinates as `(sx, sy)`.
/// Boxes are clipped to `source_size`.
pub fn decode_output(
    shape: &[i64],
    data: &[f32],
    labels: &[String],
    threshold: f32,
    scale: (f32, f32),
    source_size: (u32, u32),
) -> Result<Vec<Detection>> {
    let (rows, anchors) = match shape {
        [1, rows, anchors] if *rows > 4 && *anchors >= 0 => (*rows as usize, *anchors as usize),
        _ => {
            return Err(OrthoscanError::InvalidValue(format!(
                "unexpected detection head shape {:?}",
                shape
            )))
        }
    };
    if data.len() != rows * anchors {
        return Err(OrthoscanError::InvalidValue(format!(
            "detection head has {} values, shape {:?} needs {}",
            data.len(),
            shape,
            rows * anchors
        )));
    }
    let num_classes = rows - 4;
    if labels.len() < num_classes {
        return Err(OrthoscanError::InvalidValue(format!(
            "model has {} classes but only {} labels were provided",
            num_classes,
            labels.len()
        )));
    }

    let at = |row: usize, anchor: usize| data[row * anchors + anchor];
    let (width, height) = (source_size.0 as f32, source_size.1 as f32);

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (0..num_classes)
            .map(|c| (c, at(4 + c, anchor)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .unwrap_or((0, 0.0));
        if score < threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        )
        .scaled(scale.0, scale.1)
        .clamped(width, height);

        candidates.push(Detection::new(labels[class_id].clone(), score, bbox));
    }

    Ok(non_max_suppression(candidates, NMS_IOU_THRESHOLD))
}

/// Greedy per-label non-maximum suppression, highest confidence first
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|k| {
            k.label == candidate.label && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Reads a class-name file: one label per line, blank lines ignored
pub fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
