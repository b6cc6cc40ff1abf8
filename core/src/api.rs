use crate::error::Result;
use crate::intake::{canonical_key, ImageStore};
use crate::pipeline::ReportPipeline;
use crate::report::{DocumentRenderer, ReportId, ReportStore};
use crate::types::DiagnosisResult;
use log::info;

/// High-level service for one case: upload, process, retrieve
///
/// Ties together image intake, the report pipeline, a document renderer and
/// a report store.
///
/// # Example
///
/// ```
/// use orthoscan_core::{
///     MemoryImageStore, MemoryReportStore, ModelRegistry, PdfRenderer, ReportConfig,
///     ReportId, ReportPipeline, ReportService,
/// };
///
/// let config = ReportConfig::default();
/// let models = ModelRegistry::new();
/// let pipeline = ReportPipeline::new(&models, &config);
///
/// let mut service = ReportService::new(
///     ReportId::new("case-1").unwrap(),
///     MemoryImageStore::new(&config),
///     MemoryReportStore::new(),
///     pipeline,
///     PdfRenderer::default(),
/// );
///
/// // Nothing generated yet
/// assert!(service.fetch_report().unwrap().is_none());
///
/// // No uploads: the report holds only the summary page
/// let outcome = service.process().unwrap();
/// assert_eq!(outcome.page_count, 1);
/// assert!(service.fetch_report().unwrap().is_some());
/// ```
pub struct ReportService<'a, I, R, D> {
    id: ReportId,
    images: I,
    reports: R,
    pipeline: ReportPipeline<'a>,
    renderer: D,
}

/// Result of a successful report run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ProcessOutcome {
    /// Identifier to retrieve the document with
    pub id: ReportId,

    pub diagnosis: DiagnosisResult,

    /// Total pages including the summary page
    pub page_count: usize,

    /// Size of the stored document in bytes
    pub document_size: usize,
}

impl<'a, I, R, D> ReportService<'a, I, R, D>
where
    I: ImageStore,
    R: ReportStore,
    D: DocumentRenderer,
{
    pub fn new(
        id: ReportId,
        images: I,
        reports: R,
        pipeline: ReportPipeline<'a>,
        renderer: D,
    ) -> Self {
        Self {
            id,
            images,
            reports,
            pipeline,
            renderer,
        }
    }

    pub fn id(&self) -> &ReportId {
        &self.id
    }

    /// Stores an uploaded image under `key`, replacing earlier uploads of that key
    pub fn upload(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let key = canonical_key(key)?;
        self.images.store(&key, bytes)?;
        info!("File uploaded successfully: {}", key);
        Ok(())
    }

    /// Generates the report from the current uploads and stores it
    ///
    /// The stored document is only replaced when the whole run succeeds.
    pub fn process(&mut self) -> Result<ProcessOutcome> {
        let case = self.images.load_case()?;
        let report = self.pipeline.generate_report(&case)?;
        let document = self.renderer.render(&report)?;
        self.reports.save(&self.id, &document)?;

        info!(
            "Report {} generated: {} pages, {} bytes",
            self.id,
            report.page_count(),
            document.len()
        );

        Ok(ProcessOutcome {
            id: self.id.clone(),
            diagnosis: report.diagnosis().clone(),
            page_count: report.page_count(),
            document_size: document.len(),
        })
    }

    /// Latest stored document for this case, or `None` before the first run
    pub fn fetch_report(&self) -> Result<Option<Vec<u8>>> {
        self.reports.fetch(&self.id)
    }

    pub fn images(&self) -> &I {
        &self.images
    }

    pub fn reports(&self) -> &R {
        &self.reports
    }

    /// Consumes the service, returning the report store
    pub fn into_reports(self) -> R {
        self.reports
    }
}
