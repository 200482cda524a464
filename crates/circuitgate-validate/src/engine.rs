// circuitgate-validate/src/engine.rs
// ============================================================================
// Module: Validation Engine
// Description: Entry points that run the full validator stack for a given
//              test type and assemble a `ValidationResult`.
// Purpose: C7's top-level engine (§4.6): strictly deterministic, same input
//          always yields a byte-identical result.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! One entry point per test type. Each composes the shared calibration and
//! cross-field validators with the flavor-specific test-type validator;
//! thermography additionally runs the complementary validator. None of
//! these functions suspend, call an external service, or read the wall
//! clock (§5 "Validators and the classifier must not suspend").

use circuitgate_core::EquipmentType;
use circuitgate_core::GroundingExtraction;
use circuitgate_core::MeggerExtraction;
use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;
use circuitgate_core::ThermographyExtraction;

use crate::calibration;
use crate::complementary;
use crate::complementary::ComplementaryInputs;
use crate::cross_field;
use crate::finding::ValidationFinding;
use crate::grounding;
use crate::megger;
use crate::thermography;

/// The outcome of running the full validator stack against one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// The equipment tag the extraction reports.
    pub equipment_tag: String,
    /// Every finding produced, in validator-run order.
    pub findings: Vec<ValidationFinding>,
    /// Count of `CRITICAL` findings.
    pub critical_count: usize,
    /// Count of `MAJOR` findings.
    pub major_count: usize,
    /// Count of `MINOR` findings.
    pub minor_count: usize,
    /// Count of `INFO` findings.
    pub info_count: usize,
    /// `true` iff `critical_count == 0`.
    pub is_valid: bool,
}

fn summarize(equipment_tag: String, findings: Vec<ValidationFinding>) -> ValidationResult {
    let critical_count = findings.iter().filter(|f| f.severity == Severity::Critical).count();
    let major_count = findings.iter().filter(|f| f.severity == Severity::Major).count();
    let minor_count = findings.iter().filter(|f| f.severity == Severity::Minor).count();
    let info_count = findings.iter().filter(|f| f.severity == Severity::Info).count();
    ValidationResult {
        equipment_tag,
        findings,
        critical_count,
        major_count,
        minor_count,
        info_count,
        is_valid: critical_count == 0,
    }
}

/// Runs the full validator stack for a grounding extraction.
#[must_use]
pub fn validate_grounding(
    extraction: &GroundingExtraction,
    equipment_type: EquipmentType,
    profile: &StandardProfile,
) -> ValidationResult {
    let mut findings = grounding::validate(extraction, equipment_type, profile);
    findings.extend(cross_field::validate(&extraction.equipment.tag, profile));
    findings.extend(calibration::validate(
        extraction.calibration.as_ref().map(|c| c.expiration_date.value),
        extraction.test_conditions.date.value,
        profile,
    ));
    summarize(extraction.equipment.tag.value.clone(), findings)
}

/// Runs the full validator stack for a Megger extraction.
#[must_use]
pub fn validate_megger(extraction: &MeggerExtraction, profile: &StandardProfile) -> ValidationResult {
    let mut findings = megger::validate(extraction, profile);
    findings.extend(cross_field::validate(&extraction.equipment.tag, profile));
    findings.extend(calibration::validate(
        extraction.calibration.as_ref().map(|c| c.expiration_date.value),
        extraction.test_conditions.date.value,
        profile,
    ));
    summarize(extraction.equipment.tag.value.clone(), findings)
}

/// Runs the full validator stack for a thermography extraction, including
/// the complementary validator's OCR-augmented checks.
#[must_use]
pub fn validate_thermography(
    extraction: &ThermographyExtraction,
    profile: &StandardProfile,
    complementary_inputs: ComplementaryInputs<'_>,
) -> ValidationResult {
    let mut findings = thermography::validate(extraction, profile);
    findings.extend(cross_field::validate(&extraction.equipment.tag, profile));
    findings.extend(calibration::validate(
        extraction.calibration.as_ref().map(|c| c.expiration_date.value),
        extraction.test_conditions.inspection_date.value,
        profile,
    ));
    findings.extend(complementary::validate(extraction, complementary_inputs, profile));
    summarize(extraction.equipment.tag.value.clone(), findings)
}

#[cfg(test)]
mod tests {
    use circuitgate_core::EquipmentIdentification;
    use circuitgate_core::FieldConfidence;
    use circuitgate_core::GroundingMeasurement;
    use circuitgate_core::TestConditions;
    use time::macros::date;

    use super::*;

    fn fc<T>(value: T) -> FieldConfidence<T> {
        FieldConfidence::new(value, 0.9, "test")
    }

    fn grounding_extraction(resistances: &[f64]) -> GroundingExtraction {
        GroundingExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-1".to_string()),
                equipment_type: None,
            },
            calibration: None,
            test_conditions: TestConditions {
                date: fc(date!(2026 - 03 - 10)),
                tester: fc("J. Doe".to_string()),
                instrument: fc("Megger DET2/2".to_string()),
            },
            measurements: resistances
                .iter()
                .enumerate()
                .map(|(i, &r)| GroundingMeasurement {
                    test_point: fc(format!("TP-{}", i + 1)),
                    resistance_ohms: fc(r),
                    method: None,
                })
                .collect(),
        }
    }

    #[test]
    fn grounding_panel_pass_is_valid_with_no_findings() {
        let profile = StandardProfile::neta();
        let extraction = grounding_extraction(&[2.1, 3.0, 4.8]);
        let result = validate_grounding(&extraction, EquipmentType::Panel, &profile);
        assert!(result.findings.is_empty());
        assert!(result.is_valid);
        assert_eq!(result.equipment_tag, "PANEL-1");
    }

    #[test]
    fn grounding_fail_yields_one_major_finding() {
        let profile = StandardProfile::neta();
        let extraction = grounding_extraction(&[2.1, 3.0, 12.4]);
        let result = validate_grounding(&extraction, EquipmentType::Panel, &profile);
        assert_eq!(result.major_count, 1);
        assert_eq!(result.critical_count, 0);
        assert!(result.is_valid);
    }

    #[test]
    fn validation_is_idempotent() {
        let profile = StandardProfile::neta();
        let extraction = grounding_extraction(&[2.1, 3.0, 12.4]);
        let first = validate_grounding(&extraction, EquipmentType::Panel, &profile);
        let second = validate_grounding(&extraction, EquipmentType::Panel, &profile);
        assert_eq!(first, second);
    }
}
