// circuitgate-validate/src/cross_field.rs
// ============================================================================
// Module: Cross-Field Validator
// Description: Equipment-tag presence/consistency check shared by every
//              test-type flavor.
// Purpose: C7's cross-field validator (§4.6 item 3).
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Every extraction schema already types its numeric leaf fields
//! (`resistance_ohms`, `resistance_megaohms`, `*_c`), so "unit presence" is
//! enforced structurally by the schema itself rather than re-checked here;
//! this validator's only remaining job is the equipment tag.

use circuitgate_core::FieldConfidence;
use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;

use crate::finding::ValidationFinding;

/// Rule id for a missing or blank equipment tag.
pub const RULE_TAG_MISSING: &str = "TAG-01";

/// Validates that the equipment tag is present and non-blank.
#[must_use]
pub fn validate(tag: &FieldConfidence<String>, profile: &StandardProfile) -> Vec<ValidationFinding> {
    if tag.value.trim().is_empty() {
        return vec![ValidationFinding::new(
            Severity::Major,
            RULE_TAG_MISSING,
            "equipment tag is missing or blank",
            "\"\"",
            "non-blank tag",
            profile.reference_for(RULE_TAG_MISSING),
        )];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tag_is_flagged() {
        let profile = StandardProfile::neta();
        let tag = FieldConfidence::new(String::new(), 0.9, "");
        let findings = validate(&tag, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, RULE_TAG_MISSING);
    }

    #[test]
    fn present_tag_passes() {
        let profile = StandardProfile::neta();
        let tag = FieldConfidence::new("PANEL-1".to_string(), 0.9, "PANEL-1");
        assert!(validate(&tag, &profile).is_empty());
    }
}
