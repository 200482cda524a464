// circuitgate-api/src/openapi.rs
// ============================================================================
// Module: OpenAPI Document
// Description: A minimal, hand-maintained OpenAPI 3.0 document for the
//              routes in §6's HTTP surface table.
// Purpose: Give operators and client generators a contract without pulling
//          in a schema-derivation crate the rest of the stack doesn't use.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Static rather than derived from route handlers: the surface is small and
//! stable, and a hand-written document is easier to audit against §6 than
//! a macro-generated one. Exempt from rate limiting and authentication per
//! §5.

use axum::Json;
use serde_json::Value;
use serde_json::json;

/// `GET /api/openapi.json` — the static API contract document.
pub async fn openapi_document() -> Json<Value> {
    Json(document())
}

fn document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Circuitgate Commissioning Audit API",
            "version": "1.0.0"
        },
        "paths": {
            "/api/auth/register": { "post": { "summary": "Create user", "responses": { "201": {}, "400": {} } } },
            "/api/auth/login": { "post": { "summary": "Exchange credentials", "responses": { "200": {}, "401": {} } } },
            "/api/upload": { "post": { "summary": "Multipart upload to Task", "responses": { "200": {}, "400": {}, "413": {} } } },
            "/api/tasks/{id}": { "get": { "summary": "Task status", "responses": { "200": {}, "404": {}, "403": {} } } },
            "/api/tasks/{id}/result": { "get": { "summary": "Full analysis result", "responses": { "200": {}, "202": {}, "404": {}, "403": {} } } },
            "/api/analyses": { "get": { "summary": "Paged analysis list", "responses": { "200": {}, "401": {} } } },
            "/api/analyses/{id}": { "get": { "summary": "Analysis detail", "responses": { "200": {}, "404": {}, "403": {} } } },
            "/api/analyses/{id}/approve": { "put": { "summary": "Approve analysis", "responses": { "200": {}, "400": {}, "403": {}, "404": {} } } },
            "/api/analyses/{id}/reject": { "put": { "summary": "Reject analysis", "responses": { "200": {}, "400": {}, "403": {}, "404": {} } } },
            "/api/analyses/{id}/audit": { "get": { "summary": "Audit events", "responses": { "200": {}, "403": {}, "404": {} } } },
            "/api/analyses/{id}/report": { "get": { "summary": "Rendered report bytes", "responses": { "200": {}, "403": {}, "404": {} } } },
            "/api/health": { "get": { "summary": "Liveness alias", "responses": { "200": {} } } },
            "/api/health/live": { "get": { "summary": "Liveness", "responses": { "200": {} } } },
            "/api/health/ready": { "get": { "summary": "Readiness", "responses": { "200": {}, "503": {} } } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_surface_path() {
        let doc = document();
        let paths = doc["paths"].as_object().expect("paths object");
        assert!(paths.contains_key("/api/upload"));
        assert!(paths.contains_key("/api/analyses/{id}/reject"));
        assert!(paths.contains_key("/api/health/ready"));
    }
}
