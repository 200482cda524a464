// circuitgate-core/src/report.rs
// ============================================================================
// Module: Circuitgate Report Bundle
// Description: The self-contained structured report an analysis compiles
//              into before being handed to an external renderer.
// Purpose: Give the Report Adapter (C13) a typed assembly target, and the
//          external renderer one stable input shape.
// Dependencies: crate::entities, serde, time
// ============================================================================

//! ## Overview
//! `circuitgate-api` assembles a [`ReportBundle`] from a completed
//! [`crate::entities::Analysis`] and its [`crate::entities::Finding`]s, then
//! delegates turning it into bytes to an external [`crate::interfaces::ReportRenderer`].
//! [`JsonReportRenderer`] is the one renderer this workspace owns outright —
//! a dependency-free fallback a deployment can run with before it wires in
//! the real PDF renderer named out of scope by §1.

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::entities::EquipmentType;
use crate::entities::Finding;
use crate::entities::TestType;
use crate::entities::Verdict;
use crate::interfaces::ReportError;
use crate::interfaces::ReportRenderer;

/// The header block of a report: what the document was and when it was
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    /// Equipment tag as extracted.
    pub equipment_tag: String,
    /// Detected test type.
    pub test_type: TestType,
    /// Detected equipment type.
    pub equipment_type: EquipmentType,
    /// When the analysis was created.
    pub created_at: OffsetDateTime,
}

/// The executive-summary block of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Final verdict.
    pub verdict: Option<Verdict>,
    /// Compliance score in `[0, 100]`.
    pub compliance_score: f64,
    /// Overall extraction confidence in `[0, 1]`.
    pub overall_confidence: f64,
    /// Count of findings at `CRITICAL` severity.
    pub critical_count: usize,
    /// Count of findings at `MAJOR` severity.
    pub major_count: usize,
    /// Count of findings at `MINOR` severity.
    pub minor_count: usize,
    /// Count of findings at `INFO` severity.
    pub info_count: usize,
}

/// A self-contained, renderer-agnostic report assembled from a completed
/// analysis and its findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    /// Header block.
    pub header: ReportHeader,
    /// Executive summary block.
    pub summary: ReportSummary,
    /// Ordered findings (severity, rule id, message, evidence, remediation,
    /// standard reference all carried as-is from [`Finding`]).
    pub findings: Vec<Finding>,
}

/// A [`ReportRenderer`] that serializes the bundle as pretty-printed JSON
/// instead of rendering a PDF. Not a stand-in for the real renderer named
/// out of scope by §1 — a deployment with no renderer wired in yet still
/// gets a stable, inspectable `GET /api/analyses/{id}/report` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer;

#[async_trait]
impl ReportRenderer for JsonReportRenderer {
    async fn render(&self, bundle: &ReportBundle) -> Result<Vec<u8>, ReportError> {
        serde_json::to_vec_pretty(bundle).map_err(|e| ReportError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Evidence;
    use crate::entities::Severity;
    use crate::identifiers::AnalysisId;
    use crate::identifiers::FindingId;

    #[test]
    fn summary_counts_are_independent_of_ordering() {
        let analysis_id = AnalysisId::new();
        let findings = vec![
            Finding {
                id: FindingId::new(),
                analysis_id,
                severity: Severity::Critical,
                rule_id: "THERM-01".to_string(),
                message: "hotspot".to_string(),
                evidence: Evidence {
                    extracted_value: "90".to_string(),
                    threshold: "70".to_string(),
                    standard_reference: "NETA MTS-2023 Table 10-1".to_string(),
                },
                remediation: None,
            },
            Finding {
                id: FindingId::new(),
                analysis_id,
                severity: Severity::Minor,
                rule_id: "GND-01".to_string(),
                message: "resistance slightly high".to_string(),
                evidence: Evidence {
                    extracted_value: "5.2".to_string(),
                    threshold: "5.0".to_string(),
                    standard_reference: "NETA ATS-2021 §7.13".to_string(),
                },
                remediation: None,
            },
        ];
        let critical_count = findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .count();
        let minor_count = findings.iter().filter(|f| f.severity == Severity::Minor).count();
        assert_eq!(critical_count, 1);
        assert_eq!(minor_count, 1);
    }

    #[tokio::test]
    async fn json_renderer_round_trips_the_bundle() {
        let analysis_id = AnalysisId::new();
        let bundle = ReportBundle {
            header: ReportHeader {
                equipment_tag: "PNL-12".to_string(),
                test_type: TestType::Grounding,
                equipment_type: EquipmentType::Panel,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
            summary: ReportSummary {
                verdict: Some(Verdict::Approved),
                compliance_score: 100.0,
                overall_confidence: 0.92,
                critical_count: 0,
                major_count: 0,
                minor_count: 0,
                info_count: 0,
            },
            findings: vec![Finding {
                id: FindingId::new(),
                analysis_id,
                severity: Severity::Info,
                rule_id: "GND-00".to_string(),
                message: "informational".to_string(),
                evidence: Evidence {
                    extracted_value: "n/a".to_string(),
                    threshold: "n/a".to_string(),
                    standard_reference: "N/A".to_string(),
                },
                remediation: None,
            }],
        };
        let rendered = JsonReportRenderer.render(&bundle).await.expect("renders");
        let parsed: ReportBundle = serde_json::from_slice(&rendered).expect("valid json");
        assert_eq!(parsed, bundle);
    }
}
