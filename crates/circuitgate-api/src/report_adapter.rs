// circuitgate-api/src/report_adapter.rs
// ============================================================================
// Module: Report Adapter
// Description: Assembles a self-contained `ReportBundle` from a completed
//              analysis and its findings (§4.11, C13).
// Purpose: Give `routes::analyses::report` a pure, testable assembly step
//          before handing the bundle to an external `ReportRenderer`.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! `from_analysis` is a pure function: no I/O, no backend dependency.
//! Rendering the bundle to bytes is delegated to
//! [`circuitgate_core::ReportRenderer`], an external collaborator per §1.

use circuitgate_core::Analysis;
use circuitgate_core::Finding;
use circuitgate_core::ReportBundle;
use circuitgate_core::ReportHeader;
use circuitgate_core::ReportSummary;
use circuitgate_core::Severity;

/// Assembles a [`ReportBundle`] from a completed analysis and its findings.
#[must_use]
pub fn from_analysis(analysis: &Analysis, findings: &[Finding]) -> ReportBundle {
    let header = ReportHeader {
        equipment_tag: analysis.equipment_tag.clone(),
        test_type: analysis.test_type,
        equipment_type: analysis.equipment_type,
        created_at: analysis.created_at,
    };
    let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();
    let summary = ReportSummary {
        verdict: analysis.verdict,
        compliance_score: analysis.compliance_score.unwrap_or(0.0),
        overall_confidence: analysis.overall_confidence,
        critical_count: count(Severity::Critical),
        major_count: count(Severity::Major),
        minor_count: count(Severity::Minor),
        info_count: count(Severity::Info),
    };
    ReportBundle { header, summary, findings: findings.to_vec() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitgate_core::AnalysisId;
    use circuitgate_core::Evidence;
    use circuitgate_core::FindingId;
    use circuitgate_core::TaskId;
    use circuitgate_core::EquipmentType;
    use circuitgate_core::TestType;
    use circuitgate_core::Verdict;

    fn sample_analysis() -> Analysis {
        let now = time::OffsetDateTime::now_utc();
        Analysis {
            id: AnalysisId::new(),
            task_id: TaskId::new(),
            test_type: TestType::Grounding,
            equipment_type: EquipmentType::Panel,
            equipment_tag: "PNL-01".to_string(),
            compliance_score: Some(90.0),
            overall_confidence: 0.92,
            verdict: Some(Verdict::Review),
            rejection_reason: None,
            extraction_payload: serde_json::Value::Null,
            validation_payload: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_counts_findings_by_severity() {
        let analysis = sample_analysis();
        let findings = vec![Finding {
            id: FindingId::new(),
            analysis_id: analysis.id,
            severity: Severity::Major,
            rule_id: "GND-01".to_string(),
            message: "resistance exceeds ceiling".to_string(),
            evidence: Evidence {
                extracted_value: "12.4".to_string(),
                threshold: "5.0".to_string(),
                standard_reference: "NETA ATS-2021 §7.13".to_string(),
            },
            remediation: None,
        }];
        let bundle = from_analysis(&analysis, &findings);
        assert_eq!(bundle.summary.major_count, 1);
        assert_eq!(bundle.summary.critical_count, 0);
        assert_eq!(bundle.header.equipment_tag, "PNL-01");
        assert_eq!(bundle.findings.len(), 1);
    }

    #[test]
    fn missing_score_defaults_to_zero() {
        let mut analysis = sample_analysis();
        analysis.compliance_score = None;
        let bundle = from_analysis(&analysis, &[]);
        assert_eq!(bundle.summary.compliance_score, 0.0);
    }
}
