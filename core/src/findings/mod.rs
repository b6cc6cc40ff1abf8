//! Aggregation of per-slot detections into one ordered finding set

use crate::types::{AnatomicalSlot, Detection};
use std::collections::HashMap;

/// Ordered finding labels gathered across all slots of one report run
///
/// Order is slot order, then detector order within a slot. Classification
/// only tests membership; the order is kept for traceability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct FindingSet {
    labels: Vec<String>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the labels of a slot's detections in detector order
    pub fn extend_from_detections(&mut self, detections: &[Detection]) {
        self.labels
            .extend(detections.iter().map(|d| d.label.clone()));
    }

    pub fn push(&mut self, label: impl Into<String>) {
        self.labels.push(label.into());
    }

    /// Whether `label` occurs at least once
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FindingSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Concatenates the labels of every detection in fixed slot order
///
/// Iteration order of `per_slot` is irrelevant; slots missing from the map
/// contribute nothing.
pub fn aggregate(per_slot: &HashMap<AnatomicalSlot, Vec<Detection>>) -> FindingSet {
    let mut findings = FindingSet::new();
    for slot in AnatomicalSlot::ALL {
        if let Some(detections) = per_slot.get(&slot) {
            findings.extend_from_detections(detections);
        }
    }
    findings
}
