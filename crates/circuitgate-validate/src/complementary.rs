// circuitgate-validate/src/complementary.rs
// ============================================================================
// Module: Complementary Validator
// Description: Thermography-only cross-document checks (`COMP-001`..
//              `COMP-006`) augmented by OCR extraction passes the
//              orchestrator runs alongside the main thermography
//              extraction.
// Purpose: C7's complementary validator (§4.6 item 4). All five checks run
//          unconditionally — no short-circuiting — and their findings are
//          aggregated.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Unlike the other validators, this one accepts inputs beyond the primary
//! extraction: an optional calibration-certificate OCR pass and an
//! optional hygrometer OCR pass, both produced by the orchestrator's step
//! 6 (§4.9), plus the active profile's per-equipment-type expected phase
//! set (§4.6's open question, resolved in `DESIGN.md`).

use std::collections::HashSet;

use circuitgate_core::CertificateOcrExtraction;
use circuitgate_core::HygrometerOcrExtraction;
use circuitgate_core::Phase;
use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;
use circuitgate_core::ThermographyExtraction;

use crate::calibration;
use crate::finding::ValidationFinding;

/// Rule id: calibration expired as of the inspection date.
pub const RULE_CALIBRATION_EXPIRED: &str = "COMP-001";
/// Rule id: report-declared certificate serial does not match the OCR read.
pub const RULE_SERIAL_MISMATCH: &str = "COMP-002";
/// Rule id: reported reflected temperature disagrees with the hygrometer OCR reading.
pub const RULE_VALUE_MISMATCH: &str = "COMP-003";
/// Rule id: one or more expected phases have no corresponding hotspot photo.
pub const RULE_PHOTO_MISSING: &str = "COMP-004";
/// Rule id: a large delta-T is not accompanied by required remediation keywords.
pub const RULE_SPEC_NON_COMPLIANCE: &str = "COMP-005";
/// Rule id: the OCR'd certificate serial was too low-confidence to compare.
pub const RULE_SERIAL_ILLEGIBLE: &str = "COMP-006";

/// External inputs the complementary validator needs beyond the primary
/// thermography extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplementaryInputs<'a> {
    /// Calibration-certificate OCR result, when a certificate image was
    /// present in the document.
    pub certificate_ocr: Option<&'a CertificateOcrExtraction>,
    /// Thermo-hygrometer display OCR result, when a hygrometer image was
    /// present in the document.
    pub hygrometer_ocr: Option<&'a HygrometerOcrExtraction>,
    /// The expected phase set for this analysis's equipment type, when the
    /// active profile defines one (`None` skips `COMP-004` entirely).
    pub expected_phases: Option<&'a [Phase]>,
}

/// Extracts every [`Phase`] token mentioned anywhere in `text` (matched as
/// a standalone word, case-insensitively), used to read the phase a
/// hotspot's free-text `location`/`component` fields describe.
fn phases_in_text(text: &str) -> HashSet<Phase> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter_map(Phase::normalize)
        .collect()
}

/// The set of phases observed across a thermography extraction's hotspots,
/// read from each hotspot's location and component fields.
fn observed_phases(extraction: &ThermographyExtraction) -> HashSet<Phase> {
    let mut phases = HashSet::new();
    for hotspot in &extraction.hotspots {
        phases.extend(phases_in_text(&hotspot.location.value));
        phases.extend(phases_in_text(&hotspot.component.value));
    }
    phases
}

/// Runs all five complementary checks against `extraction`, aggregating
/// every finding produced. No check short-circuits another: a document
/// that fails `COMP-001`, `COMP-002`, `COMP-003`, and `COMP-005`
/// simultaneously yields four findings (§8 "complementary aggregation").
#[must_use]
pub fn validate(
    extraction: &ThermographyExtraction,
    inputs: ComplementaryInputs<'_>,
    profile: &StandardProfile,
) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    // COMP-001: calibration expiration, re-branded from the shared check.
    let expiration = extraction.calibration.as_ref().map(|c| c.expiration_date.value);
    let inspection_date = extraction.test_conditions.inspection_date.value;
    if let Some((expiration, as_of)) = calibration::check(expiration, inspection_date) {
        findings.push(ValidationFinding::new(
            Severity::Critical,
            RULE_CALIBRATION_EXPIRED,
            format!("calibration expired on {expiration}, before the inspection date {as_of}"),
            format!("{expiration}"),
            format!("valid on {as_of}"),
            profile.reference_for(RULE_CALIBRATION_EXPIRED),
        ));
    }

    // COMP-002 / COMP-006: declared vs. OCR'd certificate serial.
    if let (Some(declared), Some(ocr)) = (extraction.calibration.as_ref(), inputs.certificate_ocr) {
        if ocr.serial.confidence < profile.complementary.serial_confidence_threshold {
            findings.push(ValidationFinding::new(
                Severity::Major,
                RULE_SERIAL_ILLEGIBLE,
                format!(
                    "calibration certificate OCR confidence {} is below {}; serial could not be read reliably",
                    ocr.serial.confidence, profile.complementary.serial_confidence_threshold
                ),
                format!("{}", ocr.serial.confidence),
                format!("{}", profile.complementary.serial_confidence_threshold),
                profile.reference_for(RULE_SERIAL_ILLEGIBLE),
            ));
        } else {
            let declared_serial = declared.certificate_serial.value.trim().to_ascii_uppercase();
            let ocr_serial = ocr.serial.value.trim().to_ascii_uppercase();
            if declared_serial != ocr_serial {
                findings.push(ValidationFinding::new(
                    Severity::Critical,
                    RULE_SERIAL_MISMATCH,
                    format!(
                        "report-declared certificate serial \"{}\" does not match OCR-extracted serial \"{}\"",
                        declared.certificate_serial.value, ocr.serial.value
                    ),
                    declared.certificate_serial.value.clone(),
                    ocr.serial.value.clone(),
                    profile.reference_for(RULE_SERIAL_MISMATCH),
                ));
            }
        }
    }

    // COMP-003: reflected temperature vs. hygrometer OCR reading.
    if let Some(hygrometer) = inputs.hygrometer_ocr {
        let reported = extraction.thermal_metadata.reflected_temperature_c.value;
        let observed = hygrometer.temperature_c.value;
        let delta = (reported - observed).abs();
        if delta > profile.complementary.temp_match_tolerance {
            findings.push(ValidationFinding::new(
                Severity::Critical,
                RULE_VALUE_MISMATCH,
                format!(
                    "reported reflected temperature {reported}\u{b0}C disagrees with the hygrometer OCR reading {observed}\u{b0}C by {delta:.1}\u{b0}C"
                ),
                format!("{reported}"),
                format!("{observed} \u{b1} {}", profile.complementary.temp_match_tolerance),
                profile.reference_for(RULE_VALUE_MISMATCH),
            ));
        }
    }

    // COMP-004: expected phase set vs. observed hotspot locations.
    if let Some(expected) = inputs.expected_phases {
        let observed = observed_phases(extraction);
        let missing: Vec<Phase> = expected.iter().copied().filter(|p| !observed.contains(p)).collect();
        if !missing.is_empty() {
            findings.push(ValidationFinding::new(
                Severity::Critical,
                RULE_PHOTO_MISSING,
                format!("no hotspot photo covers phase(s) {missing:?}"),
                format!("{missing:?}"),
                format!("{expected:?}"),
                profile.reference_for(RULE_PHOTO_MISSING),
            ));
        }
    }

    // COMP-005: large delta-T without a required remediation keyword.
    if let Some(max_delta_t) = extraction.max_delta_t() {
        if max_delta_t > profile.complementary.spec_delta_t_threshold {
            let comments = extraction.report_comments.as_deref().unwrap_or_default().to_ascii_lowercase();
            let has_keyword = profile
                .complementary
                .spec_required_keywords
                .iter()
                .any(|kw| comments.contains(&kw.to_ascii_lowercase()));
            if !has_keyword {
                findings.push(ValidationFinding::new(
                    Severity::Critical,
                    RULE_SPEC_NON_COMPLIANCE,
                    format!(
                        "max delta-T {max_delta_t:.1}\u{b0}C exceeds {:.1}\u{b0}C with no remediation keyword in report comments",
                        profile.complementary.spec_delta_t_threshold
                    ),
                    format!("{max_delta_t:.1}"),
                    format!("{:.1}", profile.complementary.spec_delta_t_threshold),
                    profile.reference_for(RULE_SPEC_NON_COMPLIANCE),
                ));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use circuitgate_core::Calibration;
    use circuitgate_core::EquipmentIdentification;
    use circuitgate_core::FieldConfidence;
    use circuitgate_core::Hotspot;
    use circuitgate_core::ThermalMetadata;
    use circuitgate_core::ThermographyTestConditions;
    use time::macros::date;

    use super::*;

    fn fc<T>(value: T) -> FieldConfidence<T> {
        FieldConfidence::new(value, 0.9, "test")
    }

    fn base_extraction() -> ThermographyExtraction {
        ThermographyExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-9".to_string()),
                equipment_type: None,
            },
            calibration: Some(Calibration {
                certificate_serial: fc("FLIR-42X".to_string()),
                expiration_date: fc(date!(2025 - 12 - 01)),
            }),
            test_conditions: ThermographyTestConditions {
                inspection_date: fc(date!(2026 - 01 - 15)),
                inspector: fc("J. Doe".to_string()),
                load: None,
                camera_model: fc("FLIR E8".to_string()),
                camera_serial: fc("FLIR-42X".to_string()),
            },
            thermal_metadata: ThermalMetadata {
                emissivity: fc(0.95),
                ambient_temperature_c: fc(25.0),
                reflected_temperature_c: fc(25.0),
                distance_m: fc(1.0),
                humidity_pct: None,
            },
            hotspots: vec![Hotspot {
                location: fc("Phase A terminal".to_string()),
                component: fc("breaker".to_string()),
                max_temperature_c: fc(60.0),
                reference_temperature_c: fc(25.0),
            }],
            report_comments: None,
        }
    }

    #[test]
    fn four_checks_fire_simultaneously_without_short_circuiting() {
        let profile = StandardProfile::neta();
        let extraction = base_extraction();
        let certificate = CertificateOcrExtraction {
            serial: fc("FLIR-99Z".to_string()),
            lab: None,
        };
        let hygrometer = HygrometerOcrExtraction {
            temperature_c: fc(40.0),
            humidity_pct: fc(50.0),
        };
        let inputs = ComplementaryInputs {
            certificate_ocr: Some(&certificate),
            hygrometer_ocr: Some(&hygrometer),
            expected_phases: None,
        };
        let findings = validate(&extraction, inputs, &profile);
        let rule_ids: HashSet<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(rule_ids.contains(RULE_CALIBRATION_EXPIRED));
        assert!(rule_ids.contains(RULE_SERIAL_MISMATCH));
        assert!(rule_ids.contains(RULE_VALUE_MISMATCH));
        assert!(rule_ids.contains(RULE_SPEC_NON_COMPLIANCE));
        assert_eq!(findings.len(), 4);
    }

    #[test]
    fn low_confidence_ocr_yields_illegible_not_mismatch() {
        let profile = StandardProfile::neta();
        let mut extraction = base_extraction();
        extraction.calibration.as_mut().unwrap().expiration_date = fc(date!(2027 - 01 - 01));
        let certificate = CertificateOcrExtraction {
            serial: FieldConfidence::new("FLI...".to_string(), 0.55, "test"),
            lab: None,
        };
        let inputs = ComplementaryInputs {
            certificate_ocr: Some(&certificate),
            hygrometer_ocr: None,
            expected_phases: None,
        };
        let findings = validate(&extraction, inputs, &profile);
        let rule_ids: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(rule_ids.contains(&RULE_SERIAL_ILLEGIBLE));
        assert!(!rule_ids.contains(&RULE_SERIAL_MISMATCH));
    }

    #[test]
    fn missing_phase_photo_is_flagged() {
        let profile = StandardProfile::neta();
        let mut extraction = base_extraction();
        extraction.calibration.as_mut().unwrap().expiration_date = fc(date!(2027 - 01 - 01));
        let expected = [Phase::A, Phase::B, Phase::C];
        let inputs = ComplementaryInputs {
            certificate_ocr: None,
            hygrometer_ocr: None,
            expected_phases: Some(&expected),
        };
        let findings = validate(&extraction, inputs, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_PHOTO_MISSING);
    }

    #[test]
    fn remediation_keyword_present_suppresses_spec_finding() {
        let profile = StandardProfile::neta();
        let mut extraction = base_extraction();
        extraction.calibration.as_mut().unwrap().expiration_date = fc(date!(2027 - 01 - 01));
        extraction.report_comments = Some("Retorque all terminals per recommendation.".to_string());
        let inputs = ComplementaryInputs::default();
        let findings = validate(&extraction, inputs, &profile);
        assert!(findings.iter().all(|f| f.rule_id != RULE_SPEC_NON_COMPLIANCE));
    }
}
