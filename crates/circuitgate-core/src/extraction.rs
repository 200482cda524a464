// circuitgate-core/src/extraction.rs
// ============================================================================
// Module: Circuitgate Extraction Schemas
// Description: Typed, confidence-annotated extraction payloads per test type.
// Purpose: Give C4/C5/C6/C7 one shared schema vocabulary so the LLM adapter,
//          the per-flavor extractors, and the validation engine agree on
//          shape without re-deriving it at each seam.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every leaf value an extractor reports is wrapped in [`FieldConfidence`]
//! rather than modeled as a bare value or a sentinel string: unknown or
//! absent fields are explicit `Option<FieldConfidence<T>>`, never a
//! placeholder.

use serde::Deserialize;
use serde::Serialize;
use time::Date;

// ============================================================================
// SECTION: Field confidence
// ============================================================================

/// The minimum confidence below which a leaf field is flagged for review.
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.7;

/// The minimum confidence for calibration expiration dates specifically.
pub const CALIBRATION_REVIEW_THRESHOLD: f64 = 0.8;

/// A single extracted leaf value, annotated with the model's confidence and
/// the literal source text it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence<T> {
    /// The extracted value.
    pub value: T,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// The literal span of the source document the model cited.
    pub source_text: String,
}

impl<T> FieldConfidence<T> {
    /// Wraps a value with its confidence and cited source text.
    pub fn new(value: T, confidence: f64, source_text: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            source_text: source_text.into(),
        }
    }

    /// Whether this field's confidence clears the given review threshold.
    #[must_use]
    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

// ============================================================================
// SECTION: Shared sub-records
// ============================================================================

/// Calibration metadata shared by grounding, megger, and thermography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Calibration certificate serial number.
    pub certificate_serial: FieldConfidence<String>,
    /// Calibration expiration date.
    pub expiration_date: FieldConfidence<Date>,
}

/// Common test-conditions block for resistance-based tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConditions {
    /// Date the test was performed.
    pub date: FieldConfidence<Date>,
    /// Name of the person who performed the test.
    pub tester: FieldConfidence<String>,
    /// Instrument used to perform the test.
    pub instrument: FieldConfidence<String>,
}

/// Equipment identification common to every extraction flavor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentIdentification {
    /// The equipment tag as printed on the document.
    pub tag: FieldConfidence<String>,
    /// The equipment type, if the model could classify it.
    pub equipment_type: Option<FieldConfidence<String>>,
}

// ============================================================================
// SECTION: Grounding
// ============================================================================

/// A single ground-resistance measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingMeasurement {
    /// The test point label, e.g. `"TP-1"`.
    pub test_point: FieldConfidence<String>,
    /// Resistance in ohms.
    pub resistance_ohms: FieldConfidence<f64>,
    /// The measurement method, when reported.
    pub method: Option<FieldConfidence<String>>,
}

/// Extraction result for a grounding (earth resistance) test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingExtraction {
    /// Equipment identification.
    pub equipment: EquipmentIdentification,
    /// Calibration block, when the instrument reports one.
    pub calibration: Option<Calibration>,
    /// Conditions under which the test was performed.
    pub test_conditions: TestConditions,
    /// Ordered measurements as they appear on the document.
    pub measurements: Vec<GroundingMeasurement>,
}

impl GroundingExtraction {
    /// The minimum reported resistance, or `None` if there are no
    /// measurements.
    #[must_use]
    pub fn min_resistance(&self) -> Option<f64> {
        self.measurements
            .iter()
            .map(|m| m.resistance_ohms.value)
            .reduce(f64::min)
    }

    /// The maximum reported resistance, or `None` if there are no
    /// measurements.
    #[must_use]
    pub fn max_resistance(&self) -> Option<f64> {
        self.measurements
            .iter()
            .map(|m| m.resistance_ohms.value)
            .reduce(f64::max)
    }

    /// The arithmetic mean of reported resistances, or `None` if there are
    /// no measurements.
    #[must_use]
    pub fn avg_resistance(&self) -> Option<f64> {
        if self.measurements.is_empty() {
            return None;
        }
        #[allow(
            clippy::cast_precision_loss,
            reason = "measurement counts are small and never approach f64's precision limit"
        )]
        let count = self.measurements.len() as f64;
        let sum: f64 = self.measurements.iter().map(|m| m.resistance_ohms.value).sum();
        Some(sum / count)
    }
}

// ============================================================================
// SECTION: Megger (insulation resistance)
// ============================================================================

/// A single phase's insulation-resistance reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResistance {
    /// The phase label, e.g. `"A"`, `"B-C"`.
    pub phase: FieldConfidence<String>,
    /// Resistance in megaohms.
    pub resistance_megaohms: FieldConfidence<f64>,
}

/// Extraction result for an insulation-resistance (Megger) test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeggerExtraction {
    /// Equipment identification.
    pub equipment: EquipmentIdentification,
    /// Calibration block, when the instrument reports one.
    pub calibration: Option<Calibration>,
    /// Test voltage applied, in volts.
    pub test_voltage: FieldConfidence<f64>,
    /// Per-phase resistance readings.
    pub phase_readings: Vec<PhaseResistance>,
    /// Polarization index, when the instrument reports one.
    pub polarization_index: Option<FieldConfidence<f64>>,
}

// ============================================================================
// SECTION: Thermography
// ============================================================================

/// The NETA MTS severity band a hotspot's delta-T falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThermalSeverity {
    /// delta_t < 5 °C.
    Normal,
    /// delta_t in `[5, 15)` °C.
    Attention,
    /// delta_t in `[15, 35)` °C.
    Intermediate,
    /// delta_t in `[35, 70)` °C.
    Serious,
    /// delta_t >= 70 °C.
    Critical,
}

impl ThermalSeverity {
    /// Classifies a delta-T value (°C) per the NETA MTS table.
    ///
    /// Bands are inclusive-low, exclusive-high.
    #[must_use]
    pub fn from_delta_t(delta_t: f64) -> Self {
        if delta_t >= 70.0 {
            Self::Critical
        } else if delta_t >= 35.0 {
            Self::Serious
        } else if delta_t >= 15.0 {
            Self::Intermediate
        } else if delta_t >= 5.0 {
            Self::Attention
        } else {
            Self::Normal
        }
    }
}

/// Thermal imaging metadata for a thermography inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalMetadata {
    /// Emissivity setting used for the capture.
    pub emissivity: FieldConfidence<f64>,
    /// Ambient temperature in °C.
    pub ambient_temperature_c: FieldConfidence<f64>,
    /// Reflected temperature in °C.
    pub reflected_temperature_c: FieldConfidence<f64>,
    /// Distance from camera to target, in meters.
    pub distance_m: FieldConfidence<f64>,
    /// Relative humidity, as a percentage.
    pub humidity_pct: Option<FieldConfidence<f64>>,
}

/// Thermography-specific test conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermographyTestConditions {
    /// Date of inspection; the "current date" for expiration checks.
    pub inspection_date: FieldConfidence<Date>,
    /// Name of the inspector.
    pub inspector: FieldConfidence<String>,
    /// Load condition at the time of inspection (e.g. percent of rated).
    pub load: Option<FieldConfidence<String>>,
    /// Camera model used.
    pub camera_model: FieldConfidence<String>,
    /// Camera serial number.
    pub camera_serial: FieldConfidence<String>,
}

/// A single thermal hotspot reported on a thermography inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// Physical location of the hotspot, e.g. `"Phase A terminal"`.
    pub location: FieldConfidence<String>,
    /// Component the hotspot was found on.
    pub component: FieldConfidence<String>,
    /// Maximum observed temperature, °C.
    pub max_temperature_c: FieldConfidence<f64>,
    /// Reference temperature, °C (typically the ambient or a comparable
    /// unloaded point).
    pub reference_temperature_c: FieldConfidence<f64>,
}

impl Hotspot {
    /// `max - reference`, in °C.
    #[must_use]
    pub fn delta_t(&self) -> f64 {
        self.max_temperature_c.value - self.reference_temperature_c.value
    }

    /// The NETA MTS severity band for this hotspot's delta-T.
    #[must_use]
    pub fn severity(&self) -> ThermalSeverity {
        ThermalSeverity::from_delta_t(self.delta_t())
    }
}

/// Extraction result for a thermography inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermographyExtraction {
    /// Equipment identification.
    pub equipment: EquipmentIdentification,
    /// Calibration block, when the camera reports one.
    pub calibration: Option<Calibration>,
    /// Conditions under which the inspection was performed.
    pub test_conditions: ThermographyTestConditions,
    /// Imaging metadata.
    pub thermal_metadata: ThermalMetadata,
    /// Ordered hotspots as they appear across the inspected images.
    pub hotspots: Vec<Hotspot>,
    /// Free-text remediation / findings commentary from the report, used by
    /// `COMP-005`'s keyword check. Provenance: extracted by the same
    /// thermography extractor pass, not a separate one (open question,
    /// resolved in DESIGN.md).
    pub report_comments: Option<String>,
}

impl ThermographyExtraction {
    /// The largest delta-T across all hotspots, or `None` with no hotspots.
    #[must_use]
    pub fn max_delta_t(&self) -> Option<f64> {
        self.hotspots.iter().map(Hotspot::delta_t).reduce(f64::max)
    }

    /// The highest severity band across all hotspots, or `None` with no
    /// hotspots.
    #[must_use]
    pub fn max_severity(&self) -> Option<ThermalSeverity> {
        self.hotspots.iter().map(Hotspot::severity).max()
    }

    /// Count of hotspots in the `CRITICAL` band.
    #[must_use]
    pub fn critical_count(&self) -> usize {
        self.hotspots
            .iter()
            .filter(|h| h.severity() == ThermalSeverity::Critical)
            .count()
    }

    /// Count of hotspots in the `SERIOUS` band.
    #[must_use]
    pub fn serious_count(&self) -> usize {
        self.hotspots
            .iter()
            .filter(|h| h.severity() == ThermalSeverity::Serious)
            .count()
    }

    /// Merges a batch of additional hotspots produced by a later extraction
    /// pass (documents with more than 10 images are extracted in batches;
    /// merging concatenates hotspots and leaves derived fields to be
    /// recomputed by the accessors above, which read `hotspots` directly).
    pub fn merge_batch(&mut self, other: ThermographyExtraction) {
        self.hotspots.extend(other.hotspots);
    }
}

// ============================================================================
// SECTION: OCR extractors
// ============================================================================

/// Extraction result for a calibration certificate OCR pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateOcrExtraction {
    /// Serial number read off the certificate image.
    pub serial: FieldConfidence<String>,
    /// Calibration lab name, when legible.
    pub lab: Option<FieldConfidence<String>>,
}

/// Extraction result for a thermo-hygrometer display OCR pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygrometerOcrExtraction {
    /// Temperature reading, °C.
    pub temperature_c: FieldConfidence<f64>,
    /// Relative humidity reading, as a percentage.
    pub humidity_pct: FieldConfidence<f64>,
}

// ============================================================================
// SECTION: Overall confidence / review gate
// ============================================================================

/// A leaf-field confidence summary over an extraction, used to compute the
/// analysis's overall confidence and `needs_review` flag.
pub trait LeafConfidences {
    /// Returns the confidence of every leaf field in extraction order,
    /// excluding the calibration expiration date (it is reviewed against a
    /// stricter threshold, see [`Self::calibration_expiration_confidence`]).
    fn leaf_confidences(&self) -> Vec<f64>;

    /// The calibration expiration date leaf's confidence, when the
    /// extraction has a calibration block.
    fn calibration_expiration_confidence(&self) -> Option<f64>;

    /// Every leaf confidence, including the calibration expiration date,
    /// for feeding into [`overall_confidence`].
    fn all_confidences(&self) -> Vec<f64> {
        let mut all = self.leaf_confidences();
        all.extend(self.calibration_expiration_confidence());
        all
    }

    /// Every leaf confidence tagged with whether it is the calibration
    /// expiration date, for feeding into [`needs_review`].
    fn tagged_confidences(&self) -> Vec<(f64, bool)> {
        let mut tagged: Vec<(f64, bool)> =
            self.leaf_confidences().into_iter().map(|confidence| (confidence, false)).collect();
        if let Some(confidence) = self.calibration_expiration_confidence() {
            tagged.push((confidence, true));
        }
        tagged
    }
}

impl LeafConfidences for GroundingExtraction {
    fn leaf_confidences(&self) -> Vec<f64> {
        let mut leaves = vec![self.equipment.tag.confidence];
        leaves.extend(self.equipment.equipment_type.as_ref().map(|f| f.confidence));
        leaves.extend(self.calibration.as_ref().map(|c| c.certificate_serial.confidence));
        leaves.push(self.test_conditions.date.confidence);
        leaves.push(self.test_conditions.tester.confidence);
        leaves.push(self.test_conditions.instrument.confidence);
        for measurement in &self.measurements {
            leaves.push(measurement.test_point.confidence);
            leaves.push(measurement.resistance_ohms.confidence);
            leaves.extend(measurement.method.as_ref().map(|f| f.confidence));
        }
        leaves
    }

    fn calibration_expiration_confidence(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.expiration_date.confidence)
    }
}

impl LeafConfidences for MeggerExtraction {
    fn leaf_confidences(&self) -> Vec<f64> {
        let mut leaves = vec![self.equipment.tag.confidence, self.test_voltage.confidence];
        leaves.extend(self.equipment.equipment_type.as_ref().map(|f| f.confidence));
        leaves.extend(self.calibration.as_ref().map(|c| c.certificate_serial.confidence));
        leaves.extend(self.polarization_index.as_ref().map(|f| f.confidence));
        for reading in &self.phase_readings {
            leaves.push(reading.phase.confidence);
            leaves.push(reading.resistance_megaohms.confidence);
        }
        leaves
    }

    fn calibration_expiration_confidence(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.expiration_date.confidence)
    }
}

impl LeafConfidences for ThermographyExtraction {
    fn leaf_confidences(&self) -> Vec<f64> {
        let mut leaves = vec![
            self.equipment.tag.confidence,
            self.test_conditions.inspection_date.confidence,
            self.test_conditions.inspector.confidence,
            self.test_conditions.camera_model.confidence,
            self.test_conditions.camera_serial.confidence,
            self.thermal_metadata.emissivity.confidence,
            self.thermal_metadata.ambient_temperature_c.confidence,
            self.thermal_metadata.reflected_temperature_c.confidence,
            self.thermal_metadata.distance_m.confidence,
        ];
        leaves.extend(self.equipment.equipment_type.as_ref().map(|f| f.confidence));
        leaves.extend(self.calibration.as_ref().map(|c| c.certificate_serial.confidence));
        leaves.extend(self.test_conditions.load.as_ref().map(|f| f.confidence));
        leaves.extend(self.thermal_metadata.humidity_pct.as_ref().map(|f| f.confidence));
        for hotspot in &self.hotspots {
            leaves.push(hotspot.location.confidence);
            leaves.push(hotspot.component.confidence);
            leaves.push(hotspot.max_temperature_c.confidence);
            leaves.push(hotspot.reference_temperature_c.confidence);
        }
        leaves
    }

    fn calibration_expiration_confidence(&self) -> Option<f64> {
        self.calibration.as_ref().map(|c| c.expiration_date.confidence)
    }
}

/// The overall confidence for an extraction: the mean of its leaf
/// confidences, or `1.0` for an extraction with no leaf fields (never
/// expected in practice, but keeps the function total).
#[must_use]
pub fn overall_confidence(leaves: &[f64]) -> f64 {
    if leaves.is_empty() {
        return 1.0;
    }
    #[allow(
        clippy::cast_precision_loss,
        reason = "leaf field counts are small and never approach f64's precision limit"
    )]
    let count = leaves.len() as f64;
    leaves.iter().sum::<f64>() / count
}

/// Whether an extraction needs human review because some leaf field fell
/// below its applicable confidence threshold (0.8 for calibration
/// expiration dates, 0.7 otherwise).
#[must_use]
pub fn needs_review(leaves: &[(f64, bool)]) -> bool {
    leaves.iter().any(|&(confidence, is_calibration_date)| {
        let threshold = if is_calibration_date {
            CALIBRATION_REVIEW_THRESHOLD
        } else {
            DEFAULT_REVIEW_THRESHOLD
        };
        confidence < threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc<T>(value: T, confidence: f64) -> FieldConfidence<T> {
        FieldConfidence::new(value, confidence, "test")
    }

    #[test]
    fn thermal_severity_bands_are_inclusive_low_exclusive_high() {
        assert_eq!(ThermalSeverity::from_delta_t(4.999), ThermalSeverity::Normal);
        assert_eq!(ThermalSeverity::from_delta_t(5.0), ThermalSeverity::Attention);
        assert_eq!(ThermalSeverity::from_delta_t(14.999), ThermalSeverity::Attention);
        assert_eq!(ThermalSeverity::from_delta_t(15.0), ThermalSeverity::Intermediate);
        assert_eq!(ThermalSeverity::from_delta_t(34.999), ThermalSeverity::Intermediate);
        assert_eq!(ThermalSeverity::from_delta_t(35.0), ThermalSeverity::Serious);
        assert_eq!(ThermalSeverity::from_delta_t(69.999), ThermalSeverity::Serious);
        assert_eq!(ThermalSeverity::from_delta_t(70.0), ThermalSeverity::Critical);
        assert_eq!(ThermalSeverity::from_delta_t(500.0), ThermalSeverity::Critical);
    }

    #[test]
    fn grounding_derived_fields_match_measurement_list() {
        let extraction = GroundingExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-1".to_string(), 0.9),
                equipment_type: None,
            },
            calibration: None,
            test_conditions: TestConditions {
                date: fc(time::macros::date!(2026 - 03 - 10), 0.9),
                tester: fc("J. Doe".to_string(), 0.9),
                instrument: fc("Megger DET2/2".to_string(), 0.9),
            },
            measurements: vec![
                GroundingMeasurement {
                    test_point: fc("TP-1".to_string(), 0.9),
                    resistance_ohms: fc(2.1, 0.95),
                    method: None,
                },
                GroundingMeasurement {
                    test_point: fc("TP-2".to_string(), 0.9),
                    resistance_ohms: fc(3.0, 0.95),
                    method: None,
                },
                GroundingMeasurement {
                    test_point: fc("TP-3".to_string(), 0.9),
                    resistance_ohms: fc(4.8, 0.95),
                    method: None,
                },
            ],
        };
        assert_eq!(extraction.min_resistance(), Some(2.1));
        assert_eq!(extraction.max_resistance(), Some(4.8));
        assert!((extraction.avg_resistance().unwrap() - 3.3).abs() < 1e-9);
    }

    #[test]
    fn grounding_leaf_confidences_include_every_measurement_and_omit_absent_calibration() {
        let extraction = GroundingExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-1".to_string(), 0.9),
                equipment_type: None,
            },
            calibration: None,
            test_conditions: TestConditions {
                date: fc(time::macros::date!(2026 - 03 - 10), 0.9),
                tester: fc("J. Doe".to_string(), 0.9),
                instrument: fc("Megger DET2/2".to_string(), 0.9),
            },
            measurements: vec![GroundingMeasurement {
                test_point: fc("TP-1".to_string(), 0.9),
                resistance_ohms: fc(2.1, 0.95),
                method: None,
            }],
        };
        assert_eq!(extraction.leaf_confidences().len(), 5);
        assert_eq!(extraction.calibration_expiration_confidence(), None);
        assert_eq!(extraction.all_confidences().len(), 5);
        assert_eq!(extraction.tagged_confidences().len(), 5);
    }

    #[test]
    fn grounding_tagged_confidences_flags_only_the_calibration_expiration_leaf() {
        let extraction = GroundingExtraction {
            equipment: EquipmentIdentification {
                tag: fc("PANEL-1".to_string(), 0.9),
                equipment_type: None,
            },
            calibration: Some(Calibration {
                certificate_serial: fc("CERT-1".to_string(), 0.9),
                expiration_date: fc(time::macros::date!(2027 - 01 - 01), 0.6),
            }),
            test_conditions: TestConditions {
                date: fc(time::macros::date!(2026 - 03 - 10), 0.9),
                tester: fc("J. Doe".to_string(), 0.9),
                instrument: fc("Megger DET2/2".to_string(), 0.9),
            },
            measurements: vec![],
        };
        assert_eq!(extraction.calibration_expiration_confidence(), Some(0.6));
        let tagged = extraction.tagged_confidences();
        assert_eq!(tagged.iter().filter(|(_, is_cal)| *is_cal).count(), 1);
        assert!(tagged.contains(&(0.6, true)));
    }

    #[test]
    fn hotspot_delta_t_and_severity_are_consistent() {
        let hotspot = Hotspot {
            location: fc("Phase A".to_string(), 0.9),
            component: fc("breaker".to_string(), 0.9),
            max_temperature_c: fc(120.0, 0.95),
            reference_temperature_c: fc(30.0, 0.95),
        };
        assert!((hotspot.delta_t() - 90.0).abs() < 1e-9);
        assert_eq!(hotspot.severity(), ThermalSeverity::Critical);
    }

    #[test]
    fn overall_confidence_is_the_mean_of_leaves() {
        assert!((overall_confidence(&[0.8, 0.9, 1.0]) - 0.9).abs() < 1e-9);
        assert!((overall_confidence(&[]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn needs_review_applies_the_calibration_specific_threshold() {
        assert!(!needs_review(&[(0.75, true), (0.9, false)]));
        assert!(needs_review(&[(0.75, false)]));
        assert!(needs_review(&[(0.79, true)]));
    }
}
