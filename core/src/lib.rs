pub mod api;
pub mod cli;
pub mod detection;
pub mod diagnosis;
pub mod error;
pub mod findings;
pub mod intake;
pub mod pipeline;
pub mod report;
pub mod types;

pub use api::{ProcessOutcome, ReportService};
pub use cli::report::TextReport;
pub use detection::{AnnotationStyle, Detector, FixedDetector, ModelRegistry};
pub use diagnosis::classify;
pub use error::{OrthoscanError, Result};
pub use findings::{aggregate, FindingSet};
pub use intake::{CaseImages, DirectoryImageStore, ImageStore, MemoryImageStore, StoredImage};
pub use pipeline::ReportPipeline;
pub use report::{
    DirectoryReportStore, DocumentRenderer, MemoryReportStore, Page, PdfRenderer, Report,
    ReportId, ReportStore,
};
pub use types::*;
