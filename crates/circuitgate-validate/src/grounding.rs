// circuitgate-validate/src/grounding.rs
// ============================================================================
// Module: Grounding Validator
// Description: Per-equipment-type ceiling and non-negativity checks for
//              ground/earth resistance measurements.
// Purpose: C7's grounding test-type validator (§4.6 item 1).
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! One finding per offending measurement, not one finding for the whole
//! extraction: a report with three measurements over ceiling yields three
//! `GND-01` findings, each carrying its own evidence.

use circuitgate_core::EquipmentType;
use circuitgate_core::GroundingExtraction;
use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;

use crate::finding::ValidationFinding;

/// Rule id for a measurement exceeding the profile's per-equipment ceiling.
pub const RULE_CEILING_EXCEEDED: &str = "GND-01";
/// Rule id for a measurement reported as negative resistance.
pub const RULE_NEGATIVE_RESISTANCE: &str = "GND-02";

/// Validates a grounding extraction against `profile`'s per-equipment-type
/// ceiling table.
#[must_use]
pub fn validate(
    extraction: &GroundingExtraction,
    equipment_type: EquipmentType,
    profile: &StandardProfile,
) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let ceiling = profile.grounding_ceiling(equipment_type);

    for measurement in &extraction.measurements {
        let value = measurement.resistance_ohms.value;

        if value < 0.0 {
            findings.push(ValidationFinding::new(
                Severity::Major,
                RULE_NEGATIVE_RESISTANCE,
                format!(
                    "measurement at {} reports a negative resistance",
                    measurement.test_point.value
                ),
                format!("{value}"),
                "non-negative",
                profile.reference_for(RULE_NEGATIVE_RESISTANCE),
            ));
            continue;
        }

        if let Some(ceiling) = ceiling {
            if value > ceiling {
                findings.push(ValidationFinding::new(
                    Severity::Major,
                    RULE_CEILING_EXCEEDED,
                    format!(
                        "ground resistance at {} ({value} \u{3a9}) exceeds the {equipment_type:?} ceiling",
                        measurement.test_point.value
                    ),
                    format!("{value}"),
                    format!("{ceiling}"),
                    profile.reference_for(RULE_CEILING_EXCEEDED),
                ));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use circuitgate_core::EquipmentIdentification;
    use circuitgate_core::FieldConfidence;
    use circuitgate_core::GroundingMeasurement;
    use circuitgate_core::TestConditions;

    use super::*;

    fn fc<T>(value: T) -> FieldConfidence<T> {
        FieldConfidence::new(value, 0.9, "test")
    }

    fn extraction(resistances: &[f64]) -> GroundingExtraction {
        GroundingExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-1".to_string()),
                equipment_type: None,
            },
            calibration: None,
            test_conditions: TestConditions {
                date: fc(time::macros::date!(2026 - 03 - 10)),
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
    fn passing_panel_yields_no_findings() {
        let profile = StandardProfile::neta();
        let extraction = extraction(&[2.1, 3.0, 4.8]);
        let findings = validate(&extraction, EquipmentType::Panel, &profile);
        assert!(findings.is_empty());
    }

    #[test]
    fn one_measurement_over_ceiling_yields_one_major_finding() {
        let profile = StandardProfile::neta();
        let extraction = extraction(&[2.1, 3.0, 12.4]);
        let findings = validate(&extraction, EquipmentType::Panel, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Major);
        assert_eq!(findings[0].rule_id, RULE_CEILING_EXCEEDED);
        assert_eq!(findings[0].evidence.extracted_value, "12.4");
        assert_eq!(findings[0].evidence.threshold, "5");
        assert_eq!(findings[0].evidence.standard_reference, "NETA ATS-2021 \u{a7}7.13");
    }

    #[test]
    fn negative_resistance_is_flagged_regardless_of_ceiling() {
        let profile = StandardProfile::neta();
        let extraction = extraction(&[-0.5]);
        let findings = validate(&extraction, EquipmentType::Panel, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_NEGATIVE_RESISTANCE);
    }
}
