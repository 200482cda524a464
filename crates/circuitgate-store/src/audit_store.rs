// circuitgate-store/src/audit_store.rs
// ============================================================================
// Module: SQLite Audit Store
// Description: Durable, append-only AuditStore backed by SQLite.
// Purpose: Record every extraction/validation/review event for an analysis,
//          without ever exposing an update or delete path.
// Dependencies: circuitgate-core, rusqlite
// ============================================================================

use async_trait::async_trait;
use circuitgate_core::AnalysisId;
use circuitgate_core::AuditEvent;
use circuitgate_core::AuditEventType;
use circuitgate_core::AuditStore;
use circuitgate_core::AuditStoreError;
use rusqlite::params;

use crate::conn::SqliteHandle;
use crate::conn::decode_timestamp;
use crate::conn::encode_timestamp;

/// `SQLite`-backed [`AuditStore`]. Offers only `append` and
/// `list_by_analysis`; there is no method on this type that updates or
/// deletes a row once written.
#[derive(Clone)]
pub struct SqliteAuditStore {
    handle: SqliteHandle,
}

impl SqliteAuditStore {
    /// Wraps a shared connection handle.
    #[must_use]
    pub fn new(handle: SqliteHandle) -> Self {
        Self { handle }
    }
}

fn event_type_to_text(event_type: AuditEventType) -> &'static str {
    match event_type {
        AuditEventType::ExtractionStarted => "extraction_started",
        AuditEventType::ExtractionCompleted => "extraction_completed",
        AuditEventType::ExtractionFailed => "extraction_failed",
        AuditEventType::ValidationRuleApplied => "validation_rule_applied",
        AuditEventType::FindingGenerated => "finding_generated",
        AuditEventType::ValidationCompleted => "validation_completed",
        AuditEventType::HumanReviewApproved => "human_review_approved",
        AuditEventType::HumanReviewRejected => "human_review_rejected",
    }
}

fn event_type_from_text(text: &str) -> Result<AuditEventType, AuditStoreError> {
    match text {
        "extraction_started" => Ok(AuditEventType::ExtractionStarted),
        "extraction_completed" => Ok(AuditEventType::ExtractionCompleted),
        "extraction_failed" => Ok(AuditEventType::ExtractionFailed),
        "validation_rule_applied" => Ok(AuditEventType::ValidationRuleApplied),
        "finding_generated" => Ok(AuditEventType::FindingGenerated),
        "validation_completed" => Ok(AuditEventType::ValidationCompleted),
        "human_review_approved" => Ok(AuditEventType::HumanReviewApproved),
        "human_review_rejected" => Ok(AuditEventType::HumanReviewRejected),
        other => Err(AuditStoreError::Io(format!("unknown audit event type: {other}"))),
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEvent> {
    let invalid = |column: &str| {
        rusqlite::Error::InvalidColumnType(0, column.to_string(), rusqlite::types::Type::Text)
    };
    let id: String = row.get("id")?;
    let analysis_id: String = row.get("analysis_id")?;
    let event_type: String = row.get("event_type")?;
    let event_timestamp: String = row.get("event_timestamp")?;
    let details: String = row.get("details")?;
    Ok(AuditEvent {
        id: id.parse().map_err(|_| invalid("id"))?,
        analysis_id: analysis_id.parse().map_err(|_| invalid("analysis_id"))?,
        event_type: event_type_from_text(&event_type).map_err(|_| invalid("event_type"))?,
        event_timestamp: decode_timestamp(&event_timestamp).map_err(|_| invalid("event_timestamp"))?,
        model_version: row.get("model_version")?,
        prompt_version: row.get("prompt_version")?,
        rule_id: row.get("rule_id")?,
        confidence_score: row.get("confidence_score")?,
        details: serde_json::from_str(&details).map_err(|_| invalid("details"))?,
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditStoreError> {
        let event_timestamp = encode_timestamp(event.event_timestamp)
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        let details = serde_json::to_string(&event.details).map_err(|e| AuditStoreError::Io(e.to_string()))?;
        self.handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO audit_logs
                        (id, analysis_id, event_type, event_timestamp, model_version,
                         prompt_version, rule_id, confidence_score, details)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        event.id.as_str(),
                        event.analysis_id.as_str(),
                        event_type_to_text(event.event_type),
                        event_timestamp,
                        event.model_version,
                        event.prompt_version,
                        event.rule_id,
                        event.confidence_score,
                        details,
                    ],
                )
            })
            .map_err(|e| AuditStoreError::Io(e.to_string()))?;
        Ok(())
    }

    async fn list_by_analysis(&self, analysis_id: AnalysisId) -> Result<Vec<AuditEvent>, AuditStoreError> {
        self.handle
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, analysis_id, event_type, event_timestamp, model_version,
                            prompt_version, rule_id, confidence_score, details
                     FROM audit_logs WHERE analysis_id = ?1 ORDER BY event_timestamp ASC",
                )?;
                let rows = stmt.query_map(params![analysis_id.as_str()], row_to_event)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| AuditStoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitgate_core::AuditEventId;
    use circuitgate_core::TaskId;
    use circuitgate_core::UserId;

    fn seed_analysis(handle: &SqliteHandle) -> AnalysisId {
        let owner_id = UserId::new();
        let task_id = TaskId::new();
        let analysis_id = AnalysisId::new();
        let now = encode_timestamp(time::OffsetDateTime::now_utc()).expect("encodes");
        handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO users (id, email, password_hash, active, created_at)
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    params![owner_id.as_str(), format!("{owner_id}@example.com"), "hash", now],
                )?;
                conn.execute(
                    "INSERT INTO tasks
                        (id, owner_id, filename, object_key, byte_size, status, error_message,
                         created_at, updated_at)
                     VALUES (?1, ?2, 'f.pdf', 'key', 10, 'COMPLETED', NULL, ?3, ?3)",
                    params![task_id.as_str(), owner_id.as_str(), now],
                )?;
                conn.execute(
                    "INSERT INTO analyses
                        (id, task_id, test_type, equipment_type, equipment_tag,
                         compliance_score, overall_confidence, verdict, rejection_reason,
                         extraction_payload, validation_payload, created_at, updated_at)
                     VALUES (?1, ?2, 'grounding', 'PANEL', 'PNL-1', NULL, 0.9, NULL, NULL,
                             '{}', '{}', ?3, ?3)",
                    params![analysis_id.as_str(), task_id.as_str(), now],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .expect("seed succeeds");
        analysis_id
    }

    fn make_event(analysis_id: AnalysisId, event_type: AuditEventType, offset_seconds: i64) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            analysis_id,
            event_type,
            event_timestamp: time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(offset_seconds),
            model_version: None,
            prompt_version: None,
            rule_id: None,
            confidence_score: None,
            details: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn append_then_list_preserves_timestamp_order() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let analysis_id = seed_analysis(&handle);
        let store = SqliteAuditStore::new(handle);
        let first = make_event(analysis_id, AuditEventType::ExtractionStarted, 0);
        let second = make_event(analysis_id, AuditEventType::ExtractionCompleted, 5);
        store.append(&second).await.expect("append succeeds");
        store.append(&first).await.expect("append succeeds");

        let events = store
            .list_by_analysis(analysis_id)
            .await
            .expect("list succeeds");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::ExtractionStarted);
        assert_eq!(events[1].event_type, AuditEventType::ExtractionCompleted);
    }
}
