//! Core type definitions for orthodontic report generation
//!
//! This module provides the fundamental types used throughout the orthoscan library:
//! - [`AnatomicalSlot`]: The five fixed radiograph positions of a case
//! - [`ModelKind`]: Detection model family shared between slots
//! - [`Detection`] and [`BoundingBox`]: Per-image detector output
//! - [`DiagnosisResult`]: Rule-based classification of aggregated findings
//! - [`ReportConfig`] and [`ModelPaths`]: Runtime configuration

mod config;
mod detection;
mod diagnosis;
mod slot;

pub use config::{ModelPaths, ReportConfig, DEFAULT_CONFIDENCE, DEFAULT_REPORT_FILE_NAME};
pub use detection::{BoundingBox, Detection};
pub use diagnosis::{DiagnosisResult, MalocclusionClass, SecondaryFinding, RECOMMENDATION};
pub use slot::{AnatomicalSlot, ModelKind};
