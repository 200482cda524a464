// circuitgate-validate/src/verdict.rs
// ============================================================================
// Module: Finding & Verdict Service
// Description: Pure transformations from a `ValidationResult` to persisted
//              findings, a compliance score, and a verdict.
// Purpose: C8 (§4.7): `to_persisted`, `compute_score`, `compute_verdict`.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Every function here is a pure, total transformation over already-
//! computed findings — no I/O, no randomness, no clock reads. §3 invariant
//! 3 and §4.7 are implemented verbatim.

use circuitgate_core::AnalysisId;
use circuitgate_core::Evidence;
use circuitgate_core::Finding;
use circuitgate_core::FindingId;
use circuitgate_core::Severity;
use circuitgate_core::Verdict;

use crate::finding::ValidationFinding;

/// Score penalty per `CRITICAL` finding.
pub const CRITICAL_PENALTY: f64 = 25.0;
/// Score penalty per `MAJOR` finding.
pub const MAJOR_PENALTY: f64 = 10.0;
/// Score penalty per `MINOR` finding.
pub const MINOR_PENALTY: f64 = 2.0;
/// The score threshold below which a non-rejected analysis is routed to
/// human review.
pub const REVIEW_SCORE_FLOOR: f64 = 95.0;
/// The confidence threshold below which a non-rejected analysis is routed
/// to human review.
pub const REVIEW_CONFIDENCE_FLOOR: f64 = 0.7;

/// Attaches a fresh identifier and the owning analysis id to a validator's
/// output, filling a default `"N/A"` standard reference if the validator
/// somehow left one blank (§3 invariant 2: every finding's evidence has a
/// non-empty `standard_reference`).
#[must_use]
pub fn to_persisted(validation_finding: ValidationFinding, analysis_id: AnalysisId) -> Finding {
    let mut evidence = validation_finding.evidence;
    if evidence.standard_reference.trim().is_empty() {
        evidence.standard_reference = Evidence::UNKNOWN_REFERENCE.to_string();
    }
    Finding {
        id: FindingId::new(),
        analysis_id,
        severity: validation_finding.severity,
        rule_id: validation_finding.rule_id,
        message: validation_finding.message,
        evidence,
        remediation: validation_finding.remediation,
    }
}

/// Computes the compliance score per §3 invariant 3:
/// `max(0, 100 - 25*critical - 10*major - 2*minor)`. `INFO` findings never
/// affect the score.
#[must_use]
pub fn compute_score(findings: &[Finding]) -> f64 {
    let critical = findings.iter().filter(|f| f.severity == Severity::Critical).count();
    let major = findings.iter().filter(|f| f.severity == Severity::Major).count();
    let minor = findings.iter().filter(|f| f.severity == Severity::Minor).count();
    #[allow(
        clippy::cast_precision_loss,
        reason = "finding counts per analysis are small and never approach f64's precision limit"
    )]
    let penalty = CRITICAL_PENALTY * critical as f64 + MAJOR_PENALTY * major as f64 + MINOR_PENALTY * minor as f64;
    (100.0 - penalty).max(0.0)
}

/// Computes the verdict per §3 invariant 4 / §4.7: `REJECTED` if any
/// `CRITICAL` finding is present; else `REVIEW` if the score is below
/// [`REVIEW_SCORE_FLOOR`] or confidence is below [`REVIEW_CONFIDENCE_FLOOR`];
/// else `APPROVED`.
#[must_use]
pub fn compute_verdict(findings: &[Finding], score: f64, overall_confidence: f64) -> Verdict {
    let has_critical = findings.iter().any(|f| f.severity == Severity::Critical);
    if has_critical {
        return Verdict::Rejected;
    }
    if score < REVIEW_SCORE_FLOOR || overall_confidence < REVIEW_CONFIDENCE_FLOOR {
        return Verdict::Review;
    }
    Verdict::Approved
}

#[cfg(test)]
mod tests {
    use circuitgate_core::EquipmentType;
    use circuitgate_core::GroundingExtraction;

    use super::*;
    use crate::engine;

    fn finding(severity: Severity) -> Finding {
        Finding {
            id: FindingId::new(),
            analysis_id: AnalysisId::new(),
            severity,
            rule_id: "TEST-01".to_string(),
            message: "test".to_string(),
            evidence: Evidence {
                extracted_value: "1".to_string(),
                threshold: "0".to_string(),
                standard_reference: "N/A".to_string(),
            },
            remediation: None,
        }
    }

    #[test]
    fn compute_score_matches_the_weighted_formula() {
        let findings = vec![finding(Severity::Critical), finding(Severity::Major), finding(Severity::Minor)];
        assert!((compute_score(&findings) - (100.0 - 25.0 - 10.0 - 2.0)).abs() < 1e-9);
    }

    #[test]
    fn compute_score_floors_at_zero() {
        let findings: Vec<Finding> = (0..10).map(|_| finding(Severity::Critical)).collect();
        assert_eq!(compute_score(&findings), 0.0);
    }

    #[test]
    fn info_findings_never_affect_score() {
        let findings = vec![finding(Severity::Info), finding(Severity::Info)];
        assert_eq!(compute_score(&findings), 100.0);
    }

    #[test]
    fn any_critical_finding_forces_rejected_regardless_of_score_or_confidence() {
        let findings = vec![finding(Severity::Critical)];
        assert_eq!(compute_verdict(&findings, 100.0, 1.0), Verdict::Rejected);
    }

    #[test]
    fn low_score_or_low_confidence_routes_to_review() {
        assert_eq!(compute_verdict(&[], 90.0, 1.0), Verdict::Review);
        assert_eq!(compute_verdict(&[], 100.0, 0.5), Verdict::Review);
    }

    #[test]
    fn clean_high_confidence_result_is_approved() {
        assert_eq!(compute_verdict(&[], 100.0, 0.95), Verdict::Approved);
    }

    #[test]
    fn verdict_monotonicity_adding_a_critical_finding_forces_rejected() {
        let approved_findings = vec![finding(Severity::Minor)];
        let score = compute_score(&approved_findings);
        assert_eq!(compute_verdict(&approved_findings, score, 0.95), Verdict::Review);

        let mut with_critical = approved_findings;
        with_critical.push(finding(Severity::Critical));
        let new_score = compute_score(&with_critical);
        assert_eq!(compute_verdict(&with_critical, new_score, 0.95), Verdict::Rejected);
    }

    #[test]
    fn end_to_end_grounding_pass_matches_scenario_one() {
        let profile = circuitgate_core::StandardProfile::neta();
        let analysis_id = AnalysisId::new();
        let extraction = GroundingExtraction {
            equipment: circuitgate_core::EquipmentIdentification {
                tag: circuitgate_core::FieldConfidence::new("PANEL-1".to_string(), 0.92, "PANEL-1"),
                equipment_type: None,
            },
            calibration: Some(circuitgate_core::Calibration {
                certificate_serial: circuitgate_core::FieldConfidence::new("CERT-1".to_string(), 0.9, "CERT-1"),
                expiration_date: circuitgate_core::FieldConfidence::new(time::macros::date!(2027 - 01 - 01), 0.9, "2027-01-01"),
            }),
            test_conditions: circuitgate_core::TestConditions {
                date: circuitgate_core::FieldConfidence::new(time::macros::date!(2026 - 03 - 10), 0.9, "2026-03-10"),
                tester: circuitgate_core::FieldConfidence::new("J. Doe".to_string(), 0.9, "J. Doe"),
                instrument: circuitgate_core::FieldConfidence::new("Megger DET2/2".to_string(), 0.9, "DET2/2"),
            },
            measurements: vec![
                circuitgate_core::GroundingMeasurement {
                    test_point: circuitgate_core::FieldConfidence::new("TP-1".to_string(), 0.9, "TP-1"),
                    resistance_ohms: circuitgate_core::FieldConfidence::new(2.1, 0.95, "2.1"),
                    method: None,
                },
                circuitgate_core::GroundingMeasurement {
                    test_point: circuitgate_core::FieldConfidence::new("TP-2".to_string(), 0.9, "TP-2"),
                    resistance_ohms: circuitgate_core::FieldConfidence::new(3.0, 0.95, "3.0"),
                    method: None,
                },
                circuitgate_core::GroundingMeasurement {
                    test_point: circuitgate_core::FieldConfidence::new("TP-3".to_string(), 0.9, "TP-3"),
                    resistance_ohms: circuitgate_core::FieldConfidence::new(4.8, 0.95, "4.8"),
                    method: None,
                },
            ],
        };

        let result = engine::validate_grounding(&extraction, EquipmentType::Panel, &profile);
        let findings: Vec<Finding> = result.findings.into_iter().map(|f| to_persisted(f, analysis_id)).collect();
        let score = compute_score(&findings);
        let verdict = compute_verdict(&findings, score, 0.92);

        assert!(findings.is_empty());
        assert_eq!(score, 100.0);
        assert_eq!(verdict, Verdict::Approved);
    }
}
