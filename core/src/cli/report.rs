use crate::api::ProcessOutcome;
use std::fmt;

/// Text report formatter for a finished report run
pub struct TextReport<'a> {
    outcome: &'a ProcessOutcome,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(outcome: &'a ProcessOutcome) -> Self {
        Self { outcome }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orthodontic Report")?;
        writeln!(f, "==================")?;
        writeln!(f)?;
        writeln!(f, "Case:           {}", self.outcome.id)?;
        writeln!(f, "Pages:          {}", self.outcome.page_count)?;
        writeln!(f, "Document Size:  {} bytes", self.outcome.document_size)?;
        writeln!(
            f,
            "Primary Class:  {}",
            self.outcome.diagnosis.primary_class
        )?;

        let findings: Vec<_> = self
            .outcome
            .diagnosis
            .secondary_findings
            .iter()
            .map(|s| s.marker_label())
            .collect();
        if findings.is_empty() {
            writeln!(f, "Findings:       none")?;
        } else {
            writeln!(f, "Findings:       {}", findings.join(", "))?;
        }
        writeln!(f)?;

        writeln!(f, "{}", self.outcome.diagnosis)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportId;
    use crate::types::{DiagnosisResult, MalocclusionClass, SecondaryFinding};

    #[test]
    fn test_text_report_format() {
        let outcome = ProcessOutcome {
            id: ReportId::new("case-3").unwrap(),
            diagnosis: DiagnosisResult::new(
                MalocclusionClass::ClassII,
                [SecondaryFinding::OpenBite, SecondaryFinding::DeepBite],
            ),
            page_count: 4,
            document_size: 2048,
        };

        let report = TextReport::new(&outcome);
        let output = format!("{}", report);

        assert!(output.contains("Orthodontic Report"));
        assert!(output.contains("Case:           case-3"));
        assert!(output.contains("Pages:          4"));
        assert!(output.contains("Primary Class:  Class II"));
        assert!(output.contains("Findings:       Deep Bite, Open Bite"));
        assert!(output.contains("Class II Malocclusion detected."));
        assert!(output.contains("Recommendation: Consult an orthodontist"));
    }

    #[test]
    fn test_text_report_without_findings() {
        let outcome = ProcessOutcome {
            id: ReportId::default(),
            diagnosis: DiagnosisResult::default(),
            page_count: 1,
            document_size: 10,
        };

        let output = TextReport::new(&outcome).to_string();
        assert!(output.contains("Findings:       none"));
    }
}
