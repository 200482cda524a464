// circuitgate-validate/src/thermography.rs
// ============================================================================
// Module: Thermography Validator
// Description: Per-hotspot delta-T severity mapping and emissivity-setting
//              check.
// Purpose: C7's thermography test-type validator (§4.6 item 1).
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! [`ThermalSeverity::NORMAL`] hotspots never produce a finding — only
//! `ATTENTION` and above do, mapped per the fixed table in §4.4/§4.6.

use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;
use circuitgate_core::ThermalSeverity;
use circuitgate_core::ThermographyExtraction;

use crate::finding::ValidationFinding;

/// Rule id for a hotspot whose delta-T falls in a non-`NORMAL` severity band.
pub const RULE_HOTSPOT_SEVERITY: &str = "THERM-01";
/// Rule id for an emissivity setting outside the profile's tolerance.
pub const RULE_EMISSIVITY_OUT_OF_RANGE: &str = "THERM-02";

/// Maps a hotspot's NETA MTS severity band to a validation finding
/// severity, per §4.6: `CRITICAL -> CRITICAL`, `SERIOUS -> CRITICAL`,
/// `INTERMEDIATE -> MAJOR`, `ATTENTION -> MINOR`, `NORMAL` suppressed.
#[must_use]
pub fn map_severity(thermal_severity: ThermalSeverity) -> Option<Severity> {
    match thermal_severity {
        ThermalSeverity::Critical | ThermalSeverity::Serious => Some(Severity::Critical),
        ThermalSeverity::Intermediate => Some(Severity::Major),
        ThermalSeverity::Attention => Some(Severity::Minor),
        ThermalSeverity::Normal => None,
    }
}

/// Validates a thermography extraction's hotspots and imaging metadata
/// against `profile`.
#[must_use]
pub fn validate(extraction: &ThermographyExtraction, profile: &StandardProfile) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    for hotspot in &extraction.hotspots {
        let thermal_severity = hotspot.severity();
        if let Some(severity) = map_severity(thermal_severity) {
            let delta_t = hotspot.delta_t();
            findings.push(ValidationFinding::new(
                severity,
                RULE_HOTSPOT_SEVERITY,
                format!(
                    "hotspot at {} ({}) has a delta-T of {delta_t:.1}\u{b0}C, severity {thermal_severity:?}",
                    hotspot.location.value, hotspot.component.value
                ),
                format!("{delta_t:.1}"),
                format!("{thermal_severity:?}"),
                profile.reference_for(RULE_HOTSPOT_SEVERITY),
            ));
        }
    }

    let emissivity = extraction.thermal_metadata.emissivity.value;
    let expected = profile.expected_emissivity;
    let tolerance = profile.emissivity_tolerance;
    if (emissivity - expected).abs() > tolerance {
        findings.push(ValidationFinding::new(
            Severity::Minor,
            RULE_EMISSIVITY_OUT_OF_RANGE,
            format!("emissivity setting {emissivity} deviates from the expected {expected} by more than {tolerance}"),
            format!("{emissivity}"),
            format!("{expected} \u{b1} {tolerance}"),
            profile.reference_for(RULE_HOTSPOT_SEVERITY),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use circuitgate_core::EquipmentIdentification;
    use circuitgate_core::FieldConfidence;
    use circuitgate_core::Hotspot;
    use circuitgate_core::ThermalMetadata;
    use circuitgate_core::ThermographyTestConditions;

    use super::*;

    fn fc<T>(value: T) -> FieldConfidence<T> {
        FieldConfidence::new(value, 0.9, "test")
    }

    fn extraction(max_c: f64, reference_c: f64, emissivity: f64) -> ThermographyExtraction {
        ThermographyExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-9".to_string()),
                equipment_type: None,
            },
            calibration: None,
            test_conditions: ThermographyTestConditions {
                inspection_date: fc(time::macros::date!(2026 - 03 - 10)),
                inspector: fc("J. Doe".to_string()),
                load: None,
                camera_model: fc("FLIR E8".to_string()),
                camera_serial: fc("FLIR-42X".to_string()),
            },
            thermal_metadata: ThermalMetadata {
                emissivity: fc(emissivity),
                ambient_temperature_c: fc(25.0),
                reflected_temperature_c: fc(25.0),
                distance_m: fc(1.0),
                humidity_pct: None,
            },
            hotspots: vec![Hotspot {
                location: fc("Phase A terminal".to_string()),
                component: fc("breaker".to_string()),
                max_temperature_c: fc(max_c),
                reference_temperature_c: fc(reference_c),
            }],
            report_comments: None,
        }
    }

    #[test]
    fn normal_delta_t_produces_no_finding() {
        let profile = StandardProfile::neta();
        let extraction = extraction(32.0, 30.0, 0.95);
        assert!(validate(&extraction, &profile).is_empty());
    }

    #[test]
    fn critical_delta_t_maps_to_critical_severity() {
        let profile = StandardProfile::neta();
        let extraction = extraction(120.0, 30.0, 0.95);
        let findings = validate(&extraction, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].rule_id, RULE_HOTSPOT_SEVERITY);
    }

    #[test]
    fn emissivity_outside_tolerance_is_flagged() {
        let profile = StandardProfile::neta();
        let extraction = extraction(32.0, 30.0, 0.80);
        let findings = validate(&extraction, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_EMISSIVITY_OUT_OF_RANGE);
    }

    #[test]
    fn severity_mapping_suppresses_normal_and_covers_every_band() {
        assert_eq!(map_severity(ThermalSeverity::Normal), None);
        assert_eq!(map_severity(ThermalSeverity::Attention), Some(Severity::Minor));
        assert_eq!(map_severity(ThermalSeverity::Intermediate), Some(Severity::Major));
        assert_eq!(map_severity(ThermalSeverity::Serious), Some(Severity::Critical));
        assert_eq!(map_severity(ThermalSeverity::Critical), Some(Severity::Critical));
    }
}
