// circuitgate-extract/src/schemas.rs
// ============================================================================
// Module: Extraction Response Schemas
// Description: Fixed JSON Schema documents, one per extraction flavor,
//              matching the `circuitgate_core::extraction` field names.
// Purpose: Give the extraction client something concrete to validate the
//          provider's response against (§4.3/§4.4).
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Each schema's shape mirrors the corresponding `circuitgate_core`
//! extraction struct field-for-field, so a validated response deserializes
//! cleanly with `serde_json::from_value`.

use serde_json::Value;
use serde_json::json;

/// Builds the schema for a single `FieldConfidence<T>` leaf, given the
/// schema of its `value`.
fn field_confidence(value_schema: Value) -> Value {
    json!({
        "type": "object",
        "required": ["value", "confidence", "source_text"],
        "properties": {
            "value": value_schema,
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "source_text": { "type": "string" }
        }
    })
}

fn equipment_identification_schema() -> Value {
    json!({
        "type": "object",
        "required": ["tag"],
        "properties": {
            "tag": field_confidence(json!({ "type": "string" })),
            "equipment_type": field_confidence(json!({ "type": "string" }))
        }
    })
}

fn calibration_schema() -> Value {
    json!({
        "type": "object",
        "required": ["certificate_serial", "expiration_date"],
        "properties": {
            "certificate_serial": field_confidence(json!({ "type": "string" })),
            "expiration_date": field_confidence(json!({ "type": "string" }))
        }
    })
}

/// Schema for a [`circuitgate_core::GroundingExtraction`] response.
#[must_use]
pub fn grounding_schema() -> Value {
    json!({
        "type": "object",
        "required": ["equipment", "test_conditions", "measurements"],
        "properties": {
            "equipment": equipment_identification_schema(),
            "calibration": calibration_schema(),
            "test_conditions": {
                "type": "object",
                "required": ["date", "tester", "instrument"],
                "properties": {
                    "date": field_confidence(json!({ "type": "string" })),
                    "tester": field_confidence(json!({ "type": "string" })),
                    "instrument": field_confidence(json!({ "type": "string" }))
                }
            },
            "measurements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["test_point", "resistance_ohms"],
                    "properties": {
                        "test_point": field_confidence(json!({ "type": "string" })),
                        "resistance_ohms": field_confidence(json!({ "type": "number" })),
                        "method": field_confidence(json!({ "type": "string" }))
                    }
                }
            }
        }
    })
}

/// Schema for a [`circuitgate_core::MeggerExtraction`] response.
#[must_use]
pub fn megger_schema() -> Value {
    json!({
        "type": "object",
        "required": ["equipment", "test_voltage", "phase_readings"],
        "properties": {
            "equipment": equipment_identification_schema(),
            "calibration": calibration_schema(),
            "test_voltage": field_confidence(json!({ "type": "number" })),
            "phase_readings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["phase", "resistance_megaohms"],
                    "properties": {
                        "phase": field_confidence(json!({ "type": "string" })),
                        "resistance_megaohms": field_confidence(json!({ "type": "number" }))
                    }
                }
            },
            "polarization_index": field_confidence(json!({ "type": "number" }))
        }
    })
}

/// Schema for a [`circuitgate_core::ThermographyExtraction`] response.
#[must_use]
pub fn thermography_schema() -> Value {
    json!({
        "type": "object",
        "required": ["equipment", "test_conditions", "thermal_metadata", "hotspots"],
        "properties": {
            "equipment": equipment_identification_schema(),
            "calibration": calibration_schema(),
            "test_conditions": {
                "type": "object",
                "required": ["inspection_date", "inspector", "camera_model", "camera_serial"],
                "properties": {
                    "inspection_date": field_confidence(json!({ "type": "string" })),
                    "inspector": field_confidence(json!({ "type": "string" })),
                    "load": field_confidence(json!({ "type": "string" })),
                    "camera_model": field_confidence(json!({ "type": "string" })),
                    "camera_serial": field_confidence(json!({ "type": "string" }))
                }
            },
            "thermal_metadata": {
                "type": "object",
                "required": ["emissivity", "ambient_temperature_c", "reflected_temperature_c", "distance_m"],
                "properties": {
                    "emissivity": field_confidence(json!({ "type": "number" })),
                    "ambient_temperature_c": field_confidence(json!({ "type": "number" })),
                    "reflected_temperature_c": field_confidence(json!({ "type": "number" })),
                    "distance_m": field_confidence(json!({ "type": "number" })),
                    "humidity_pct": field_confidence(json!({ "type": "number" }))
                }
            },
            "hotspots": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["location", "component", "max_temperature_c", "reference_temperature_c"],
                    "properties": {
                        "location": field_confidence(json!({ "type": "string" })),
                        "component": field_confidence(json!({ "type": "string" })),
                        "max_temperature_c": field_confidence(json!({ "type": "number" })),
                        "reference_temperature_c": field_confidence(json!({ "type": "number" }))
                    }
                }
            },
            "report_comments": { "type": "string" }
        }
    })
}

/// Schema for a [`circuitgate_core::CertificateOcrExtraction`] response.
#[must_use]
pub fn certificate_ocr_schema() -> Value {
    json!({
        "type": "object",
        "required": ["serial"],
        "properties": {
            "serial": field_confidence(json!({ "type": "string" })),
            "lab": field_confidence(json!({ "type": "string" }))
        }
    })
}

/// Schema for a [`circuitgate_core::HygrometerOcrExtraction`] response.
#[must_use]
pub fn hygrometer_ocr_schema() -> Value {
    json!({
        "type": "object",
        "required": ["temperature_c", "humidity_pct"],
        "properties": {
            "temperature_c": field_confidence(json!({ "type": "number" })),
            "humidity_pct": field_confidence(json!({ "type": "number" }))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_check;

    #[test]
    fn grounding_schema_accepts_a_minimal_conforming_document() {
        let instance = json!({
            "equipment": { "tag": { "value": "PANEL-1", "confidence": 0.9, "source_text": "PANEL-1" } },
            "test_conditions": {
                "date": { "value": "2026-03-10", "confidence": 0.9, "source_text": "03/10/2026" },
                "tester": { "value": "J. Doe", "confidence": 0.9, "source_text": "J. Doe" },
                "instrument": { "value": "Megger DET2/2", "confidence": 0.9, "source_text": "DET2/2" }
            },
            "measurements": [
                { "test_point": { "value": "TP-1", "confidence": 0.9, "source_text": "TP-1" },
                  "resistance_ohms": { "value": 2.1, "confidence": 0.95, "source_text": "2.1" } }
            ]
        });
        assert!(schema_check::validate(&instance, &grounding_schema()).is_ok());
    }

    #[test]
    fn grounding_schema_rejects_missing_measurements() {
        let instance = json!({
            "equipment": { "tag": { "value": "PANEL-1", "confidence": 0.9, "source_text": "PANEL-1" } },
            "test_conditions": {
                "date": { "value": "2026-03-10", "confidence": 0.9, "source_text": "03/10/2026" },
                "tester": { "value": "J. Doe", "confidence": 0.9, "source_text": "J. Doe" },
                "instrument": { "value": "Megger DET2/2", "confidence": 0.9, "source_text": "DET2/2" }
            }
        });
        assert!(schema_check::validate(&instance, &grounding_schema()).is_err());
    }
}
