// circuitgate-validate/src/finding.rs
// ============================================================================
// Module: Validation Finding
// Description: The pre-persisted finding a validator emits, before C8
//              attaches an identifier and analysis id.
// Purpose: Give every validator one shared output shape the engine can
//          collect without any validator knowing about persistence.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! A [`ValidationFinding`] carries everything [`crate::verdict::to_persisted`]
//! needs to produce a [`circuitgate_core::Finding`]: severity, rule id,
//! message, evidence, and optional remediation text.

use circuitgate_core::Evidence;
use circuitgate_core::Severity;

/// A single validator's output, not yet attached to a persisted analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFinding {
    /// Severity of the finding.
    pub severity: Severity,
    /// Stable rule identifier, e.g. `"GND-01"`, `"COMP-002"`.
    pub rule_id: String,
    /// Human-readable description of the finding.
    pub message: String,
    /// Supporting evidence.
    pub evidence: Evidence,
    /// Optional remediation guidance.
    pub remediation: Option<String>,
}

impl ValidationFinding {
    /// Builds a finding whose evidence cites `standard_reference` as
    /// resolved from the active [`circuitgate_core::StandardProfile`].
    #[must_use]
    pub fn new(
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
        extracted_value: impl Into<String>,
        threshold: impl Into<String>,
        standard_reference: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            rule_id: rule_id.into(),
            message: message.into(),
            evidence: Evidence {
                extracted_value: extracted_value.into(),
                threshold: threshold.into(),
                standard_reference: standard_reference.into(),
            },
            remediation: None,
        }
    }

    /// Attaches remediation guidance to the finding.
    #[must_use]
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}
