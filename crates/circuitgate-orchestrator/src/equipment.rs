// circuitgate-orchestrator/src/equipment.rs
// ============================================================================
// Module: Equipment Type Resolution
// Description: Maps an extraction's free-text equipment-type field to the
//              closed `EquipmentType` enumeration the validation engine and
//              standard profiles are keyed on.
// Purpose: The LLM extraction returns equipment type as free text (or
//          omits it); the orchestrator needs a deterministic, total
//          mapping from that text to `EquipmentType` before it can select
//          a grounding ceiling or expected phase set.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Keyword matching in the same style as `circuitgate_extract::classifier`:
//! fixed, ordered lexicons, first match wins, unmatched or absent text
//! resolves to [`EquipmentType::Other`] rather than failing the task.

use circuitgate_core::EquipmentType;

const LEXICON: &[(EquipmentType, &[&str])] = &[
    (EquipmentType::Ups, &["ups", "uninterruptible"]),
    (EquipmentType::Ats, &["ats", "automatic transfer switch", "transfer switch"]),
    (EquipmentType::Gen, &["generator", "genset"]),
    (EquipmentType::Xfmr, &["transformer", "xfmr"]),
    (EquipmentType::Panel, &["panel", "panelboard", "switchgear", "switchboard"]),
];

/// Resolves an extraction's equipment-type text to an [`EquipmentType`],
/// defaulting to [`EquipmentType::Other`] when the text is absent or
/// matches no lexicon.
#[must_use]
pub fn resolve(equipment_type_text: Option<&str>) -> EquipmentType {
    let Some(text) = equipment_type_text else {
        return EquipmentType::Other;
    };
    let lowered = text.to_lowercase();
    for (equipment_type, keywords) in LEXICON {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return *equipment_type;
        }
    }
    EquipmentType::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_text_resolves_to_other() {
        assert_eq!(resolve(None), EquipmentType::Other);
    }

    #[test]
    fn unmatched_text_resolves_to_other() {
        assert_eq!(resolve(Some("a mystery box")), EquipmentType::Other);
    }

    #[test]
    fn matches_each_lexicon_entry() {
        assert_eq!(resolve(Some("Panelboard PNL-1")), EquipmentType::Panel);
        assert_eq!(resolve(Some("UPS Unit 3")), EquipmentType::Ups);
        assert_eq!(resolve(Some("Automatic Transfer Switch")), EquipmentType::Ats);
        assert_eq!(resolve(Some("Diesel Generator")), EquipmentType::Gen);
        assert_eq!(resolve(Some("Step-down Transformer")), EquipmentType::Xfmr);
    }

    #[test]
    fn ties_break_to_the_earlier_lexicon_entry() {
        // "ats panel" matches both ATS and Panel keywords; ATS is earlier.
        assert_eq!(resolve(Some("ats panel")), EquipmentType::Ats);
    }
}
