//! Report pages, document rendering and report retrieval

mod pdf;
mod store;

pub use pdf::{DocumentRenderer, PdfRenderer};
pub use store::{DirectoryReportStore, MemoryReportStore, ReportId, ReportStore};

use crate::types::{AnatomicalSlot, DiagnosisResult};
use image::RgbImage;

/// One page of a report
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// Radiograph with detections drawn over it
    Annotated {
        slot: AnatomicalSlot,
        title: String,
        image: RgbImage,
    },

    /// Closing page with the diagnosis text
    Summary { text: String },
}

impl Page {
    pub fn title(&self) -> Option<&str> {
        match self {
            Page::Annotated { title, .. } => Some(title),
            Page::Summary { .. } => None,
        }
    }

    pub fn slot(&self) -> Option<AnatomicalSlot> {
        match self {
            Page::Annotated { slot, .. } => Some(*slot),
            Page::Summary { .. } => None,
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Page::Summary { .. })
    }
}

/// Pages of one report run: annotated slots in slot order, summary last
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pages: Vec<Page>,
    diagnosis: DiagnosisResult,
}

impl Report {
    /// Assembles a report, appending the summary page for `diagnosis`
    pub fn new(annotated: Vec<Page>, diagnosis: DiagnosisResult) -> Self {
        let mut pages = annotated;
        pages.push(Page::Summary {
            text: diagnosis.to_string(),
        });
        Self { pages, diagnosis }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn diagnosis(&self) -> &DiagnosisResult {
        &self.diagnosis
    }

    /// Slots that produced an annotated page, in page order
    pub fn slots(&self) -> Vec<AnatomicalSlot> {
        self.pages.iter().filter_map(Page::slot).collect()
    }
}
