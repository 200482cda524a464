// circuitgate-core/src/identifiers.rs
// ============================================================================
// Module: Circuitgate Identifiers
// Description: Canonical opaque 128-bit identifiers for audit entities.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers are opaque 128-bit values (UUIDv4) that serialize as strings.
//! Validation beyond well-formedness is handled at API boundaries, not here.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Parse error for an identifier that is not a well-formed UUID.
#[derive(Debug, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct IdParseError(String);

macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID value.
            #[must_use]
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the identifier's underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Returns the identifier in its canonical hyphenated string form.
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|e| IdParseError(format!("{value}: {e}")))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdParseError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(UserId, "Identifier for a registered user.");
opaque_id!(TaskId, "Identifier for an ingestion task.");
opaque_id!(AnalysisId, "Identifier for a completed analysis.");
opaque_id!(FindingId, "Identifier for a single validation finding.");
opaque_id!(AuditEventId, "Identifier for an append-only audit event.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let id = TaskId::new();
        let text = id.to_string();
        let parsed: TaskId = text.parse().expect("valid uuid text");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_text() {
        let err = "not-a-uuid".parse::<TaskId>();
        assert!(err.is_err());
    }

    #[test]
    fn distinct_ids_are_not_equal() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let id = AnalysisId::new();
        let json = serde_json::to_string(&id).expect("serializable");
        assert_eq!(json, format!("\"{id}\""));
    }
}
