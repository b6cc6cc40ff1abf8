use std::collections::BTreeSet;
use std::fmt;

/// Fixed recommendation appended to every diagnosis
pub const RECOMMENDATION: &str = "Consult an orthodontist for detailed evaluation.";

/// Angle classification of the molar relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum MalocclusionClass {
    #[default]
    ClassI,
    ClassII,
    ClassIII,
}

impl MalocclusionClass {
    /// Detector label that marks this class, if any
    ///
    /// Class I has no marker; it is the fallback when no other class is seen.
    pub fn marker_label(&self) -> Option<&'static str> {
        match self {
            MalocclusionClass::ClassI => None,
            MalocclusionClass::ClassII => Some("Class II"),
            MalocclusionClass::ClassIII => Some("Class III"),
        }
    }

    pub fn simple_name(&self) -> &'static str {
        match self {
            MalocclusionClass::ClassI => "Class I",
            MalocclusionClass::ClassII => "Class II",
            MalocclusionClass::ClassIII => "Class III",
        }
    }
}

impl fmt::Display for MalocclusionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Independent findings reported alongside the primary class
///
/// Ordering follows the order lines appear in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum SecondaryFinding {
    DeepBite,
    OpenBite,
    Spacing,
}

impl SecondaryFinding {
    pub const ALL: [SecondaryFinding; 3] = [
        SecondaryFinding::DeepBite,
        SecondaryFinding::OpenBite,
        SecondaryFinding::Spacing,
    ];

    /// Detector label that marks this finding
    pub fn marker_label(&self) -> &'static str {
        match self {
            SecondaryFinding::DeepBite => "Deep Bite",
            SecondaryFinding::OpenBite => "Open Bite",
            SecondaryFinding::Spacing => "Spacing",
        }
    }

    /// Summary line for this finding
    pub fn summary_line(&self) -> &'static str {
        match self {
            SecondaryFinding::DeepBite => "Deep Bite detected.",
            SecondaryFinding::OpenBite => "Open Bite detected.",
            SecondaryFinding::Spacing => "Spacing issues detected.",
        }
    }
}

impl fmt::Display for SecondaryFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker_label())
    }
}

/// Structured result of rule-based classification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosisResult {
    pub primary_class: MalocclusionClass,
    pub secondary_findings: BTreeSet<SecondaryFinding>,
    pub recommendation: String,
}

impl DiagnosisResult {
    pub fn new(
        primary_class: MalocclusionClass,
        secondary_findings: impl IntoIterator<Item = SecondaryFinding>,
    ) -> Self {
        Self {
            primary_class,
            secondary_findings: secondary_findings.into_iter().collect(),
            recommendation: RECOMMENDATION.to_string(),
        }
    }

    pub fn has(&self, finding: SecondaryFinding) -> bool {
        self.secondary_findings.contains(&finding)
    }
}

impl Default for DiagnosisResult {
    fn default() -> Self {
        Self::new(MalocclusionClass::ClassI, [])
    }
}

/// Summary-page text
impl fmt::Display for DiagnosisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orthodontic Diagnosis:")?;
        writeln!(f, "{} Malocclusion detected.", self.primary_class)?;
        for finding in &self.secondary_findings {
            writeln!(f, "{}", finding.summary_line())?;
        }
        writeln!(f)?;
        write!(f, "Recommendation: {}", self.recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_class_i() {
        let result = DiagnosisResult::default();
        assert_eq!(result.primary_class, MalocclusionClass::ClassI);
        assert!(result.secondary_findings.is_empty());
        assert_eq!(result.recommendation, RECOMMENDATION);
    }

    #[test]
    fn test_summary_text() {
        let result = DiagnosisResult::new(
            MalocclusionClass::ClassIII,
            [SecondaryFinding::Spacing, SecondaryFinding::DeepBite],
        );
        let text = result.to_string();
        assert_eq!(
            text,
            "Orthodontic Diagnosis:\n\
             Class III Malocclusion detected.\n\
             Deep Bite detected.\n\
             Spacing issues detected.\n\
             \n\
             Recommendation: Consult an orthodontist for detailed evaluation."
        );
    }

    #[test]
    fn test_summary_text_without_findings() {
        let text = DiagnosisResult::default().to_string();
        assert!(text.starts_with("Orthodontic Diagnosis:\nClass I Malocclusion detected.\n\n"));
    }
}
