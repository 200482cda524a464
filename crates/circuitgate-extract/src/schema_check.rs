// circuitgate-extract/src/schema_check.rs
// ============================================================================
// Module: Response Schema Validation
// Description: Validates a provider response against a flavor's JSON schema.
// Purpose: Give the retry loop in `client.rs` one place to turn schema
//          violations into the re-prompt error text the provider sees.
// Dependencies: jsonschema, serde_json
// ============================================================================

use serde_json::Value;

/// Validates `instance` against `schema`, returning a human-readable error
/// listing every violation when it fails.
///
/// # Errors
///
/// Returns a joined error description when `instance` does not conform to
/// `schema`, or when `schema` itself is not a valid JSON Schema document.
pub fn validate(instance: &Value, schema: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema).map_err(|e| format!("invalid response schema: {e}"))?;
    let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_conforming_instance() {
        let schema = json!({
            "type": "object",
            "required": ["value"],
            "properties": { "value": { "type": "number" } }
        });
        assert!(validate(&json!({ "value": 1.0 }), &schema).is_ok());
    }

    #[test]
    fn rejects_missing_required_field() {
        let schema = json!({
            "type": "object",
            "required": ["value"],
            "properties": { "value": { "type": "number" } }
        });
        assert!(validate(&json!({}), &schema).is_err());
    }
}
