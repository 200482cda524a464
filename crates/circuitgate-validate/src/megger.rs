// circuitgate-validate/src/megger.rs
// ============================================================================
// Module: Megger Validator
// Description: IEEE 43 per-voltage-class insulation-resistance minimums and
//              polarization-index checks.
// Purpose: C7's Megger test-type validator (§4.6 item 1).
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! The insulation-resistance minimum is a hard compliance floor — a
//! reading below it is a `MAJOR` finding, same severity band as a
//! grounding ceiling breach. A low polarization index is a softer signal
//! (IEEE 43 treats PI as a supplementary diagnostic, not itself a pass/
//! fail criterion) and is reported as `MINOR`.

use circuitgate_core::MeggerExtraction;
use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;

use crate::finding::ValidationFinding;

/// Rule id for a phase reading below the voltage class's IEEE 43 minimum.
pub const RULE_BELOW_MINIMUM: &str = "MEG-01";
/// Rule id for a polarization index below the profile's minimum.
pub const RULE_LOW_POLARIZATION_INDEX: &str = "MEG-02";

/// Validates a Megger extraction against `profile`'s IEEE 43 minimums.
#[must_use]
pub fn validate(extraction: &MeggerExtraction, profile: &StandardProfile) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();
    let voltage = extraction.test_voltage.value;
    let minimum = profile.megger_minimum(voltage);

    if let Some(minimum) = minimum {
        for reading in &extraction.phase_readings {
            let value = reading.resistance_megaohms.value;
            if value < minimum {
                findings.push(ValidationFinding::new(
                    Severity::Major,
                    RULE_BELOW_MINIMUM,
                    format!(
                        "insulation resistance on phase {} ({value} M\u{3a9}) is below the IEEE 43 minimum for {voltage} V",
                        reading.phase.value
                    ),
                    format!("{value}"),
                    format!("{minimum}"),
                    profile.reference_for(RULE_BELOW_MINIMUM),
                ));
            }
        }
    }

    if let Some(pi) = &extraction.polarization_index {
        if pi.value < profile.polarization_index_minimum {
            findings.push(ValidationFinding::new(
                Severity::Minor,
                RULE_LOW_POLARIZATION_INDEX,
                format!("polarization index {} is below the minimum of {}", pi.value, profile.polarization_index_minimum),
                format!("{}", pi.value),
                format!("{}", profile.polarization_index_minimum),
                profile.reference_for(RULE_LOW_POLARIZATION_INDEX),
            ));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use circuitgate_core::EquipmentIdentification;
    use circuitgate_core::FieldConfidence;
    use circuitgate_core::PhaseResistance;

    use super::*;

    fn fc<T>(value: T) -> FieldConfidence<T> {
        FieldConfidence::new(value, 0.9, "test")
    }

    fn base_extraction(megaohms: f64, pi: Option<f64>) -> MeggerExtraction {
        MeggerExtraction {
            equipment: EquipmentIdentification {
                tag: fc("UPS-1".to_string()),
                equipment_type: None,
            },
            calibration: None,
            test_voltage: fc(1000.0),
            phase_readings: vec![PhaseResistance {
                phase: fc("A".to_string()),
                resistance_megaohms: fc(megaohms),
            }],
            polarization_index: pi.map(fc),
        }
    }

    #[test]
    fn passing_insulation_resistance_yields_no_findings() {
        let profile = StandardProfile::neta();
        let extraction = base_extraction(150.0, Some(2.5));
        assert!(validate(&extraction, &profile).is_empty());
    }

    #[test]
    fn below_minimum_resistance_is_major() {
        let profile = StandardProfile::neta();
        let extraction = base_extraction(10.0, None);
        let findings = validate(&extraction, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Major);
        assert_eq!(findings[0].rule_id, RULE_BELOW_MINIMUM);
    }

    #[test]
    fn low_polarization_index_is_minor() {
        let profile = StandardProfile::neta();
        let extraction = base_extraction(150.0, Some(1.2));
        let findings = validate(&extraction, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Minor);
        assert_eq!(findings[0].rule_id, RULE_LOW_POLARIZATION_INDEX);
    }
}
