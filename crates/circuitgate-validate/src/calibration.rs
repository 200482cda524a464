// circuitgate-validate/src/calibration.rs
// ============================================================================
// Module: Calibration Validator
// Description: Checks a calibration's expiration date against the
//              extraction's own inspection/test date.
// Purpose: C7's calibration validator (§4.6 item 2); also reused verbatim
//          by the complementary validator's `COMP-001`.
// Dependencies: circuitgate-core, time
// ============================================================================

//! ## Overview
//! The "current date" for this check is never `OffsetDateTime::now_utc()`
//! — it is the extraction's own inspection/test date, so the same
//! extraction validates identically today or ten years from now (§4.6:
//! validators "never observe wall-clock time").

use circuitgate_core::Severity;
use circuitgate_core::StandardProfile;
use time::Date;

use crate::finding::ValidationFinding;

/// Rule id for an expired calibration certificate.
pub const RULE_CALIBRATION_EXPIRED: &str = "CALIB-EXP";

/// Checks whether `expiration_date` falls before `as_of`, returning the
/// `(expiration_date, as_of)` pair when it does. Shared by this module's
/// top-level validator and the complementary validator's `COMP-001`, which
/// re-brands the same check under a different rule id (§4.6 item 4).
#[must_use]
pub fn check(expiration_date: Option<Date>, as_of: Date) -> Option<(Date, Date)> {
    let expiration_date = expiration_date?;
    (expiration_date < as_of).then_some((expiration_date, as_of))
}

/// Validates that `expiration_date` is not before `as_of` (the
/// extraction's inspection or test date). Returns an empty vector when
/// there is no calibration block to check.
#[must_use]
pub fn validate(expiration_date: Option<Date>, as_of: Date, profile: &StandardProfile) -> Vec<ValidationFinding> {
    let Some((expiration_date, as_of)) = check(expiration_date, as_of) else {
        return Vec::new();
    };

    vec![ValidationFinding::new(
        Severity::Critical,
        RULE_CALIBRATION_EXPIRED,
        format!("calibration expired on {expiration_date}, before the inspection date {as_of}"),
        format!("{expiration_date}"),
        format!("valid on {as_of}"),
        profile.reference_for(RULE_CALIBRATION_EXPIRED),
    )]
}

#[cfg(test)]
mod tests {
    use circuitgate_core::StandardProfile;
    use time::macros::date;

    use super::*;

    #[test]
    fn expired_calibration_is_critical() {
        let profile = StandardProfile::neta();
        let findings = validate(Some(date!(2025 - 12 - 01)), date!(2026 - 01 - 15), &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].evidence.standard_reference, "ISO/IEC 17025");
    }

    #[test]
    fn calibration_valid_on_inspection_date_is_not_expired() {
        let profile = StandardProfile::neta();
        let findings = validate(Some(date!(2027 - 01 - 01)), date!(2026 - 03 - 10), &profile);
        assert!(findings.is_empty());
    }

    #[test]
    fn no_calibration_block_yields_no_finding() {
        let profile = StandardProfile::neta();
        assert!(validate(None, date!(2026 - 03 - 10), &profile).is_empty());
    }
}
