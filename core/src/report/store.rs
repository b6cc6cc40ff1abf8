use crate::error::{OrthoscanError, Result};
use crate::types::ReportConfig;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Identifier of a stored report
///
/// Returned by report generation and passed back to retrieval. Each case
/// has one report slot; generating again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ReportId(String);

impl ReportId {
    /// Identifier used when no case name is given
    pub const DEFAULT: &'static str = "default";

    /// Creates an identifier from a case name
    ///
    /// # Errors
    ///
    /// Names must be non-empty and use only ASCII letters, digits, `-` or `_`.
    pub fn new(case: &str) -> Result<Self> {
        let case = case.trim();
        let valid = !case.is_empty()
            && case
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(OrthoscanError::InvalidValue(format!(
                "invalid case identifier '{}'",
                case
            )));
        }
        Ok(Self(case.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage for generated report documents
pub trait ReportStore {
    /// Stores `bytes` as the report for `id`, replacing any earlier one
    fn save(&mut self, id: &ReportId, bytes: &[u8]) -> Result<()>;

    /// Latest report for `id`, or `None` if none was generated yet
    fn fetch(&self, id: &ReportId) -> Result<Option<Vec<u8>>>;
}

/// Report store writing `<root>/<id>/<report file name>`
#[derive(Debug, Clone)]
pub struct DirectoryReportStore {
    root: PathBuf,
    file_name: String,
}

impl DirectoryReportStore {
    pub fn new(root: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            root: root.into(),
            file_name: config.report_file_name.clone(),
        }
    }

    /// Location of the document for `id`
    pub fn report_path(&self, id: &ReportId) -> PathBuf {
        self.root.join(id.as_str()).join(&self.file_name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ReportStore for DirectoryReportStore {
    fn save(&mut self, id: &ReportId, bytes: &[u8]) -> Result<()> {
        let path = self.report_path(id);
        let dir = path.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(dir)?;

        // Each writer stages into its own file; the rename replaces the
        // report atomically, last writer wins
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| e.error)?;

        debug!("Saved report {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Vec<u8>>> {
        let path = self.report_path(id);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory report store
#[derive(Debug, Clone, Default)]
pub struct MemoryReportStore {
    reports: HashMap<ReportId, Vec<u8>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn save(&mut self, id: &ReportId, bytes: &[u8]) -> Result<()> {
        self.reports.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Vec<u8>>> {
        Ok(self.reports.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_id_validation() {
        assert_eq!(ReportId::new("case-42").unwrap().as_str(), "case-42");
        assert_eq!(ReportId::default().as_str(), "default");
        assert!(ReportId::new("").is_err());
        assert!(ReportId::new("../etc").is_err());
        assert!(ReportId::new("a b").is_err());
    }

    #[test]
    fn test_directory_store_not_found_then_latest() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = DirectoryReportStore::new(temp_dir.path(), &ReportConfig::default());
        let id = ReportId::new("patient_1").unwrap();

        assert!(store.fetch(&id).unwrap().is_none());

        store.save(&id, b"first").unwrap();
        store.save(&id, b"second").unwrap();

        assert_eq!(store.fetch(&id).unwrap().unwrap(), b"second");
        assert!(store
            .report_path(&id)
            .ends_with("patient_1/Annotated_Orthodontic_Images.pdf"));

        // Only the report itself remains in the case directory
        let entries = std::fs::read_dir(temp_dir.path().join("patient_1"))
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_concurrent_saves_never_fail_or_mix() {
        let temp_dir = TempDir::new().unwrap();
        let id = ReportId::new("shared").unwrap();
        let config = ReportConfig::default();

        let writers: Vec<_> = [b'a', b'b']
            .into_iter()
            .map(|fill| {
                let mut store = DirectoryReportStore::new(temp_dir.path(), &config);
                let id = id.clone();
                std::thread::spawn(move || {
                    let payload = vec![fill; 256 * 1024];
                    (0..50)
                        .filter(|_| store.save(&id, &payload).is_err())
                        .count()
                })
            })
            .collect();

        let failures: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(failures, 0);

        let store = DirectoryReportStore::new(temp_dir.path(), &config);
        let bytes = store.fetch(&id).unwrap().unwrap();
        assert_eq!(bytes.len(), 256 * 1024);
        assert!(bytes.iter().all(|b| *b == bytes[0]));
    }

    #[test]
    fn test_cases_do_not_share_reports() {
        let mut store = MemoryReportStore::new();
        let a = ReportId::new("a").unwrap();
        let b = ReportId::new("b").unwrap();

        store.save(&a, b"report a").unwrap();

        assert_eq!(store.fetch(&a).unwrap().unwrap(), b"report a");
        assert!(store.fetch(&b).unwrap().is_none());
    }
}
