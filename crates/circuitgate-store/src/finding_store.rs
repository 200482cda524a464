// circuitgate-store/src/finding_store.rs
// ============================================================================
// Module: SQLite Finding Store
// Description: Durable FindingStore backed by SQLite.
// Purpose: Persist the findings produced by a single validation run as one
//          batch and serve them back in insertion order.
// Dependencies: circuitgate-core, rusqlite
// ============================================================================

use async_trait::async_trait;
use circuitgate_core::AnalysisId;
use circuitgate_core::Evidence;
use circuitgate_core::Finding;
use circuitgate_core::FindingStore;
use circuitgate_core::FindingStoreError;
use circuitgate_core::Severity;
use rusqlite::params;

use crate::conn::SqliteHandle;

/// `SQLite`-backed [`FindingStore`].
#[derive(Clone)]
pub struct SqliteFindingStore {
    handle: SqliteHandle,
}

impl SqliteFindingStore {
    /// Wraps a shared connection handle.
    #[must_use]
    pub fn new(handle: SqliteHandle) -> Self {
        Self { handle }
    }
}

fn severity_to_text(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "INFO",
        Severity::Minor => "MINOR",
        Severity::Major => "MAJOR",
        Severity::Critical => "CRITICAL",
    }
}

fn severity_from_text(text: &str) -> Result<Severity, FindingStoreError> {
    match text {
        "INFO" => Ok(Severity::Info),
        "MINOR" => Ok(Severity::Minor),
        "MAJOR" => Ok(Severity::Major),
        "CRITICAL" => Ok(Severity::Critical),
        other => Err(FindingStoreError::Io(format!("unknown severity: {other}"))),
    }
}

fn row_to_finding(row: &rusqlite::Row<'_>) -> rusqlite::Result<Finding> {
    let invalid = |column: &str| {
        rusqlite::Error::InvalidColumnType(0, column.to_string(), rusqlite::types::Type::Text)
    };
    let id: String = row.get("id")?;
    let analysis_id: String = row.get("analysis_id")?;
    let severity: String = row.get("severity")?;
    let evidence: String = row.get("evidence")?;
    Ok(Finding {
        id: id.parse().map_err(|_| invalid("id"))?,
        analysis_id: analysis_id.parse().map_err(|_| invalid("analysis_id"))?,
        severity: severity_from_text(&severity).map_err(|_| invalid("severity"))?,
        rule_id: row.get("rule_id")?,
        message: row.get("message")?,
        evidence: serde_json::from_str::<Evidence>(&evidence).map_err(|_| invalid("evidence"))?,
        remediation: row.get("remediation")?,
    })
}

#[async_trait]
impl FindingStore for SqliteFindingStore {
    async fn create_many(&self, findings: &[Finding]) -> Result<(), FindingStoreError> {
        if findings.is_empty() {
            return Ok(());
        }
        self.handle
            .with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                for finding in findings {
                    let evidence = serde_json::to_string(&finding.evidence).map_err(|e| {
                        rusqlite::Error::ToSqlConversionFailure(Box::new(e))
                    })?;
                    tx.execute(
                        "INSERT INTO findings
                            (id, analysis_id, severity, rule_id, message, evidence, remediation)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            finding.id.as_str(),
                            finding.analysis_id.as_str(),
                            severity_to_text(finding.severity),
                            finding.rule_id,
                            finding.message,
                            evidence,
                            finding.remediation,
                        ],
                    )?;
                }
                tx.commit()
            })
            .map_err(|e| FindingStoreError::Io(e.to_string()))
    }

    async fn list_by_analysis(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<Vec<Finding>, FindingStoreError> {
        self.handle
            .with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, analysis_id, severity, rule_id, message, evidence, remediation
                     FROM findings WHERE analysis_id = ?1 ORDER BY rowid ASC",
                )?;
                let rows = stmt.query_map(params![analysis_id.as_str()], row_to_finding)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| FindingStoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitgate_core::FindingId;
    use circuitgate_core::TaskId;
    use circuitgate_core::UserId;
    use rusqlite::OptionalExtension as _;

    fn seed_analysis(handle: &SqliteHandle) -> AnalysisId {
        let owner_id = UserId::new();
        let task_id = TaskId::new();
        let analysis_id = AnalysisId::new();
        let now = crate::conn::encode_timestamp(time::OffsetDateTime::now_utc()).expect("encodes");
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

    fn make_finding(analysis_id: AnalysisId) -> Finding {
        Finding {
            id: FindingId::new(),
            analysis_id,
            severity: Severity::Major,
            rule_id: "GND-01".to_string(),
            message: "resistance exceeds ceiling".to_string(),
            evidence: Evidence {
                extracted_value: "7.2".to_string(),
                threshold: "5".to_string(),
                standard_reference: Evidence::UNKNOWN_REFERENCE.to_string(),
            },
            remediation: Some("retest after bonding repair".to_string()),
        }
    }

    #[tokio::test]
    async fn create_many_preserves_insertion_order() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let analysis_id = seed_analysis(&handle);
        let store = SqliteFindingStore::new(handle);
        let findings = vec![
            make_finding(analysis_id),
            make_finding(analysis_id),
            make_finding(analysis_id),
        ];
        let ids: Vec<_> = findings.iter().map(|f| f.id).collect();
        store.create_many(&findings).await.expect("create succeeds");
        let loaded = store
            .list_by_analysis(analysis_id)
            .await
            .expect("list succeeds");
        let loaded_ids: Vec<_> = loaded.iter().map(|f| f.id).collect();
        assert_eq!(loaded_ids, ids);
    }

    #[tokio::test]
    async fn create_many_with_empty_slice_is_a_no_op() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let analysis_id = seed_analysis(&handle);
        let store = SqliteFindingStore::new(handle.clone());
        store.create_many(&[]).await.expect("no-op succeeds");
        let count: Option<i64> = handle
            .with_connection(|conn| {
                conn.query_row("SELECT COUNT(*) FROM findings", [], |row| row.get(0))
                    .optional()
            })
            .expect("count succeeds");
        assert_eq!(count, Some(0));
        let _ = analysis_id;
    }
}
