//! Rule-based diagnosis from aggregated findings
//!
//! The primary class is chosen by a fixed priority: any "Class II" finding
//! wins, then "Class III", otherwise Class I. A case showing both Class II
//! and Class III markers is therefore reported as Class II. Secondary
//! findings are independent membership checks.

use crate::findings::FindingSet;
use crate::types::{DiagnosisResult, MalocclusionClass, SecondaryFinding};

/// Primary classes carrying a marker label, highest priority first
const CLASS_PRIORITY: [MalocclusionClass; 2] =
    [MalocclusionClass::ClassII, MalocclusionClass::ClassIII];

/// Classifies a finding set
///
/// Depends only on which labels are present, never on their count or order.
/// An empty set yields Class I with no secondary findings.
///
/// # Example
///
/// ```
/// use orthoscan_core::{classify, FindingSet, MalocclusionClass, SecondaryFinding};
///
/// let findings: FindingSet = ["Class II", "Deep Bite", "Class II"].into_iter().collect();
/// let result = classify(&findings);
///
/// assert_eq!(result.primary_class, MalocclusionClass::ClassII);
/// assert!(result.has(SecondaryFinding::DeepBite));
/// assert_eq!(result.secondary_findings.len(), 1);
/// ```
pub fn classify(findings: &FindingSet) -> DiagnosisResult {
    let primary = primary_class(findings);

    let secondary = SecondaryFinding::ALL
        .into_iter()
        .filter(|finding| findings.contains(finding.marker_label()));

    DiagnosisResult::new(primary, secondary)
}

fn primary_class(findings: &FindingSet) -> MalocclusionClass {
    CLASS_PRIORITY
        .into_iter()
        .find(|class| {
            class
                .marker_label()
                .is_some_and(|label| findings.contains(label))
        })
        .unwrap_or(MalocclusionClass::ClassI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn findings(labels: &[&str]) -> FindingSet {
        labels.iter().copied().collect()
    }

    #[rstest]
    #[case(&[], MalocclusionClass::ClassI)]
    #[case(&["Deep Bite"], MalocclusionClass::ClassI)]
    #[case(&["Class II"], MalocclusionClass::ClassII)]
    #[case(&["Class III"], MalocclusionClass::ClassIII)]
    #[case(&["Class III", "Class II"], MalocclusionClass::ClassII)]
    #[case(&["Class II", "Class III", "Spacing"], MalocclusionClass::ClassII)]
    #[case(&["class ii"], MalocclusionClass::ClassI)]
    #[case(&["Class I"], MalocclusionClass::ClassI)]
    fn test_primary_class_priority(#[case] labels: &[&str], #[case] expected: MalocclusionClass) {
        assert_eq!(classify(&findings(labels)).primary_class, expected);
    }

    #[rstest]
    #[case(&["Deep Bite"], &[SecondaryFinding::DeepBite])]
    #[case(&["Open Bite", "Open Bite"], &[SecondaryFinding::OpenBite])]
    #[case(&["Spacing", "Class II"], &[SecondaryFinding::Spacing])]
    #[case(
        &["Spacing", "Open Bite", "Deep Bite"],
        &[SecondaryFinding::DeepBite, SecondaryFinding::OpenBite, SecondaryFinding::Spacing]
    )]
    #[case(&["Crowding"], &[])]
    fn test_secondary_findings(#[case] labels: &[&str], #[case] expected: &[SecondaryFinding]) {
        let result = classify(&findings(labels));
        let actual: Vec<_> = result.secondary_findings.iter().copied().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_example_class_ii_with_deep_bite() {
        let result = classify(&findings(&["Class II", "Deep Bite", "Class II"]));
        assert_eq!(
            result,
            DiagnosisResult::new(MalocclusionClass::ClassII, [SecondaryFinding::DeepBite])
        );
    }

    #[test]
    fn test_empty_findings() {
        assert_eq!(classify(&FindingSet::new()), DiagnosisResult::default());
    }

    #[test]
    fn test_permutation_invariance() {
        let labels = ["Class III", "Spacing", "Deep Bite", "Class II", "Open Bite"];
        let expected = classify(&findings(&labels));

        // Every rotation and its reverse
        for shift in 0..labels.len() {
            let mut rotated = labels.to_vec();
            rotated.rotate_left(shift);
            assert_eq!(classify(&findings(&rotated)), expected);
            rotated.reverse();
            assert_eq!(classify(&findings(&rotated)), expected);
        }
    }

    #[test]
    fn test_recommendation_always_present() {
        for labels in [&[][..], &["Class III", "Open Bite"][..]] {
            let result = classify(&findings(labels));
            assert_eq!(result.recommendation, crate::types::RECOMMENDATION);
        }
    }
}
