// circuitgate-core/src/profile.rs
// ============================================================================
// Module: Circuitgate Standard Profiles
// Description: Immutable threshold/citation bundles selected per task.
// Purpose: Let the validation engine (C7) be parameterized by a named
//          standard (NETA, MICROSOFT) without branching on it at each rule.
// Dependencies: std::collections::HashMap
// ============================================================================

//! ## Overview
//! A [`StandardProfile`] is constructed once per process (or per test) and
//! shared by reference; the validation engine never mutates it. Profiles
//! are selected by name and cached by the caller, matching §9's
//! "explicit configuration, no module-level mutable state" design note.

use std::collections::HashMap;

use crate::entities::EquipmentType;

/// The name of a standard profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileName {
    /// NETA ATS / IEEE 43 thresholds; the default profile.
    Neta,
    /// Microsoft data-center commissioning specification thresholds.
    Microsoft,
}

impl ProfileName {
    /// The profile name used when configuration specifies none.
    pub const DEFAULT: Self = Self::Neta;
}

/// A physical conductor phase, with A/B/C and R/S/T treated as equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// Phase A, equivalent to R.
    A,
    /// Phase B, equivalent to S.
    B,
    /// Phase C, equivalent to T.
    C,
    /// Neutral.
    N,
}

impl Phase {
    /// Normalizes an IEC-style phase label (`R`, `S`, `T`) or an
    /// ANSI-style one (`A`, `B`, `C`) to a [`Phase`]; `N` maps to neutral
    /// under either convention.
    #[must_use]
    pub fn normalize(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "A" | "R" => Some(Self::A),
            "B" | "S" => Some(Self::B),
            "C" | "T" => Some(Self::C),
            "N" => Some(Self::N),
            _ => None,
        }
    }
}

/// Complementary-validator configuration (thermography only).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementaryThresholds {
    /// Minimum OCR confidence below which a serial comparison is replaced
    /// by `COMP-006 SERIAL_ILLEGIBLE` rather than attempted.
    pub serial_confidence_threshold: f64,
    /// Maximum allowed difference (°C) between the report's reflected
    /// temperature and the hygrometer OCR reading before `COMP-003` fires.
    pub temp_match_tolerance: f64,
    /// `max_delta_t` threshold (°C) above which `COMP-005` requires the
    /// report comments to mention a remediation keyword.
    pub spec_delta_t_threshold: f64,
    /// Keywords (case-insensitive) that satisfy `COMP-005` when present in
    /// the report comments.
    pub spec_required_keywords: Vec<String>,
}

/// An immutable bundle of thresholds and citations selected per task.
///
/// # Invariants
/// - Never mutated after construction; the engine caches the resolved
///   profile for the lifetime of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardProfile {
    /// The profile's name.
    pub name: ProfileName,
    /// Grounding resistance ceilings (ohms) per equipment type.
    pub grounding_ceilings: HashMap<EquipmentType, f64>,
    /// Megger insulation-resistance minimums (megaohms) per voltage class,
    /// keyed by the nominal test voltage in volts.
    pub megger_minimums: Vec<(u32, f64)>,
    /// Minimum acceptable polarization index.
    pub polarization_index_minimum: f64,
    /// Expected emissivity setting for thermography captures.
    pub expected_emissivity: f64,
    /// Tolerance around `expected_emissivity` before a finding fires.
    pub emissivity_tolerance: f64,
    /// Complementary-validator configuration.
    pub complementary: ComplementaryThresholds,
    /// Canonical standard reference per rule id.
    pub references: HashMap<String, String>,
    /// Expected phase sets per equipment type, used by `COMP-004`. Absent
    /// entries mean the check is not applicable for that equipment type.
    pub expected_phases: HashMap<EquipmentType, Vec<Phase>>,
}

impl StandardProfile {
    /// The grounding ceiling (ohms) for an equipment type, if the profile
    /// defines one.
    #[must_use]
    pub fn grounding_ceiling(&self, equipment_type: EquipmentType) -> Option<f64> {
        self.grounding_ceilings.get(&equipment_type).copied()
    }

    /// The minimum insulation resistance (megaohms) for the voltage class
    /// at or below `voltage`, per IEEE 43's per-class table. Returns the
    /// entry for the highest voltage class not exceeding `voltage`, or the
    /// lowest class if `voltage` is below every configured class.
    #[must_use]
    pub fn megger_minimum(&self, voltage: f64) -> Option<f64> {
        let mut applicable = self
            .megger_minimums
            .iter()
            .filter(|&&(class_voltage, _)| f64::from(class_voltage) <= voltage)
            .collect::<Vec<_>>();
        applicable.sort_by_key(|&&(class_voltage, _)| class_voltage);
        applicable
            .last()
            .or_else(|| self.megger_minimums.iter().min_by_key(|&&(v, _)| v))
            .map(|&(_, minimum)| minimum)
    }

    /// The expected phase set for an equipment type, if the profile has an
    /// entry for it. No entry means `COMP-004` is not applicable (resolved
    /// open question, see `DESIGN.md`).
    #[must_use]
    pub fn expected_phases(&self, equipment_type: EquipmentType) -> Option<&[Phase]> {
        self.expected_phases.get(&equipment_type).map(Vec::as_slice)
    }

    /// The canonical standard reference for a rule id, defaulting to
    /// `"N/A"` when the profile has no citation for it.
    #[must_use]
    pub fn reference_for(&self, rule_id: &str) -> String {
        self.references
            .get(rule_id)
            .cloned()
            .unwrap_or_else(|| crate::entities::Evidence::UNKNOWN_REFERENCE.to_string())
    }

    /// The default NETA profile: NETA ATS-2021 / IEEE 43-2000 thresholds.
    #[must_use]
    pub fn neta() -> Self {
        let mut grounding_ceilings = HashMap::new();
        grounding_ceilings.insert(EquipmentType::Panel, 5.0);
        grounding_ceilings.insert(EquipmentType::Ups, 1.0);
        grounding_ceilings.insert(EquipmentType::Ats, 5.0);
        grounding_ceilings.insert(EquipmentType::Gen, 10.0);
        grounding_ceilings.insert(EquipmentType::Xfmr, 5.0);

        let mut references = HashMap::new();
        references.insert("GND-01".to_string(), "NETA ATS-2021 §7.13".to_string());
        references.insert("MEG-01".to_string(), "IEEE 43-2000".to_string());
        references.insert("MEG-02".to_string(), "IEEE 43-2000".to_string());
        references.insert("THERM-01".to_string(), "NETA MTS-2023 Table 10-1".to_string());
        references.insert("CALIB-EXP".to_string(), "ISO/IEC 17025".to_string());
        references.insert("COMP-001".to_string(), "ISO/IEC 17025".to_string());
        references.insert(
            "COMP-002".to_string(),
            "NETA MTS-2023 Table 10-1".to_string(),
        );
        references.insert(
            "COMP-003".to_string(),
            "NETA MTS-2023 Table 10-1".to_string(),
        );
        references.insert(
            "COMP-004".to_string(),
            "NETA MTS-2023 Table 10-1".to_string(),
        );
        references.insert(
            "COMP-005".to_string(),
            "NETA MTS-2023 Table 10-1".to_string(),
        );
        references.insert(
            "COMP-006".to_string(),
            "NETA MTS-2023 Table 10-1".to_string(),
        );

        let mut expected_phases = HashMap::new();
        expected_phases.insert(
            EquipmentType::Panel,
            vec![Phase::A, Phase::B, Phase::C, Phase::N],
        );
        expected_phases.insert(EquipmentType::Xfmr, vec![Phase::A, Phase::B, Phase::C]);

        Self {
            name: ProfileName::Neta,
            grounding_ceilings,
            megger_minimums: vec![(250, 25.0), (600, 100.0), (1000, 100.0), (2500, 200.0)],
            polarization_index_minimum: 2.0,
            expected_emissivity: 0.95,
            emissivity_tolerance: 0.03,
            complementary: ComplementaryThresholds {
                serial_confidence_threshold: 0.7,
                temp_match_tolerance: 2.0,
                spec_delta_t_threshold: 10.0,
                spec_required_keywords: [
                    "terminals",
                    "insulators",
                    "torque",
                    "conductors",
                    "terminais",
                    "isoladores",
                    "torque",
                    "condutores",
                ]
                .into_iter()
                .map(str::to_string)
                .collect(),
            },
            references,
            expected_phases,
        }
    }

    /// The Microsoft data-center commissioning profile: stricter grounding
    /// ceilings, the same IEEE 43 insulation table, and Microsoft SPEC
    /// citations.
    #[must_use]
    pub fn microsoft() -> Self {
        let mut base = Self::neta();
        base.name = ProfileName::Microsoft;
        base.grounding_ceilings.insert(EquipmentType::Panel, 2.0);
        base.grounding_ceilings.insert(EquipmentType::Ats, 2.0);
        base.grounding_ceilings.insert(EquipmentType::Xfmr, 2.0);
        for rule_id in [
            "GND-01", "MEG-01", "MEG-02", "THERM-01", "COMP-002", "COMP-003", "COMP-004",
            "COMP-005", "COMP-006",
        ] {
            base.references
                .insert(rule_id.to_string(), "Microsoft SPEC 26 05 00".to_string());
        }
        base
    }

    /// Resolves a profile by name.
    #[must_use]
    pub fn resolve(name: ProfileName) -> Self {
        match name {
            ProfileName::Neta => Self::neta(),
            ProfileName::Microsoft => Self::microsoft(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neta_grounding_ceilings_match_spec_examples() {
        let profile = StandardProfile::neta();
        assert_eq!(profile.grounding_ceiling(EquipmentType::Panel), Some(5.0));
        assert_eq!(profile.grounding_ceiling(EquipmentType::Ups), Some(1.0));
        assert_eq!(profile.grounding_ceiling(EquipmentType::Gen), Some(10.0));
    }

    #[test]
    fn microsoft_profile_overrides_grounding_but_keeps_megger() {
        let neta = StandardProfile::neta();
        let microsoft = StandardProfile::microsoft();
        assert_ne!(
            neta.grounding_ceiling(EquipmentType::Panel),
            microsoft.grounding_ceiling(EquipmentType::Panel)
        );
        assert_eq!(neta.megger_minimums, microsoft.megger_minimums);
    }

    #[test]
    fn phase_normalizes_ansi_and_iec_labels_equivalently() {
        assert_eq!(Phase::normalize("A"), Phase::normalize("R"));
        assert_eq!(Phase::normalize("b"), Some(Phase::B));
        assert_eq!(Phase::normalize("Z"), None);
    }

    #[test]
    fn reference_for_defaults_to_not_applicable() {
        let profile = StandardProfile::neta();
        assert_eq!(profile.reference_for("UNKNOWN-RULE"), "N/A");
        assert_eq!(profile.reference_for("GND-01"), "NETA ATS-2021 §7.13");
    }
}
