// circuitgate-store/src/analysis_store.rs
// ============================================================================
// Module: SQLite Analysis Store
// Description: Durable AnalysisStore backed by SQLite.
// Purpose: Persist analyses and serve the Review API's paged, filtered,
//          sorted listing with ownership enforced at the query level.
// Dependencies: circuitgate-core, rusqlite
// ============================================================================

use async_trait::async_trait;
use circuitgate_core::Analysis;
use circuitgate_core::AnalysisFilter;
use circuitgate_core::AnalysisId;
use circuitgate_core::AnalysisSortBy;
use circuitgate_core::AnalysisStore;
use circuitgate_core::AnalysisStoreError;
use circuitgate_core::EquipmentType;
use circuitgate_core::Page;
use circuitgate_core::SortOrder;
use circuitgate_core::TaskId;
use circuitgate_core::TestType;
use circuitgate_core::UserId;
use circuitgate_core::Verdict;
use rusqlite::OptionalExtension;
use rusqlite::ToSql;
use rusqlite::params;
use rusqlite::types::Value as SqlValue;

use crate::conn::SqliteHandle;
use crate::conn::decode_timestamp;
use crate::conn::encode_timestamp;

/// `SQLite`-backed [`AnalysisStore`].
#[derive(Clone)]
pub struct SqliteAnalysisStore {
    handle: SqliteHandle,
}

impl SqliteAnalysisStore {
    /// Wraps a shared connection handle.
    #[must_use]
    pub fn new(handle: SqliteHandle) -> Self {
        Self { handle }
    }
}

fn test_type_to_text(t: TestType) -> &'static str {
    match t {
        TestType::Grounding => "grounding",
        TestType::Megger => "megger",
        TestType::Thermography => "thermography",
    }
}

fn test_type_from_text(text: &str) -> Result<TestType, AnalysisStoreError> {
    match text {
        "grounding" => Ok(TestType::Grounding),
        "megger" => Ok(TestType::Megger),
        "thermography" => Ok(TestType::Thermography),
        other => Err(AnalysisStoreError::Invalid(format!("unknown test type: {other}"))),
    }
}

fn equipment_type_to_text(t: EquipmentType) -> &'static str {
    match t {
        EquipmentType::Panel => "PANEL",
        EquipmentType::Ups => "UPS",
        EquipmentType::Ats => "ATS",
        EquipmentType::Gen => "GEN",
        EquipmentType::Xfmr => "XFMR",
        EquipmentType::Other => "OTHER",
    }
}

fn equipment_type_from_text(text: &str) -> Result<EquipmentType, AnalysisStoreError> {
    match text {
        "PANEL" => Ok(EquipmentType::Panel),
        "UPS" => Ok(EquipmentType::Ups),
        "ATS" => Ok(EquipmentType::Ats),
        "GEN" => Ok(EquipmentType::Gen),
        "XFMR" => Ok(EquipmentType::Xfmr),
        "OTHER" => Ok(EquipmentType::Other),
        other => Err(AnalysisStoreError::Invalid(format!("unknown equipment type: {other}"))),
    }
}

fn verdict_to_text(v: Verdict) -> &'static str {
    match v {
        Verdict::Approved => "APPROVED",
        Verdict::Review => "REVIEW",
        Verdict::Rejected => "REJECTED",
    }
}

fn verdict_from_text(text: &str) -> Result<Verdict, AnalysisStoreError> {
    match text {
        "APPROVED" => Ok(Verdict::Approved),
        "REVIEW" => Ok(Verdict::Review),
        "REJECTED" => Ok(Verdict::Rejected),
        other => Err(AnalysisStoreError::Invalid(format!("unknown verdict: {other}"))),
    }
}

fn row_to_analysis(row: &rusqlite::Row<'_>) -> rusqlite::Result<Analysis> {
    let invalid = |column: &str| {
        rusqlite::Error::InvalidColumnType(0, column.to_string(), rusqlite::types::Type::Text)
    };

    let id: String = row.get("id")?;
    let task_id: String = row.get("task_id")?;
    let test_type: String = row.get("test_type")?;
    let equipment_type: String = row.get("equipment_type")?;
    let verdict: Option<String> = row.get("verdict")?;
    let extraction_payload: String = row.get("extraction_payload")?;
    let validation_payload: String = row.get("validation_payload")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Analysis {
        id: id.parse().map_err(|_| invalid("id"))?,
        task_id: task_id.parse().map_err(|_| invalid("task_id"))?,
        test_type: test_type_from_text(&test_type).map_err(|_| invalid("test_type"))?,
        equipment_type: equipment_type_from_text(&equipment_type).map_err(|_| invalid("equipment_type"))?,
        equipment_tag: row.get("equipment_tag")?,
        compliance_score: row.get("compliance_score")?,
        overall_confidence: row.get("overall_confidence")?,
        verdict: verdict
            .map(|v| verdict_from_text(&v))
            .transpose()
            .map_err(|_| invalid("verdict"))?,
        rejection_reason: row.get("rejection_reason")?,
        extraction_payload: serde_json::from_str(&extraction_payload).map_err(|_| invalid("extraction_payload"))?,
        validation_payload: serde_json::from_str(&validation_payload).map_err(|_| invalid("validation_payload"))?,
        created_at: decode_timestamp(&created_at).map_err(|_| invalid("created_at"))?,
        updated_at: decode_timestamp(&updated_at).map_err(|_| invalid("updated_at"))?,
    })
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisStore {
    async fn create(&self, analysis: &Analysis) -> Result<(), AnalysisStoreError> {
        insert_or_replace(&self.handle, analysis, true)
    }

    async fn update(&self, analysis: &Analysis) -> Result<(), AnalysisStoreError> {
        insert_or_replace(&self.handle, analysis, false)
    }

    async fn get(&self, analysis_id: AnalysisId) -> Result<Option<Analysis>, AnalysisStoreError> {
        self.handle
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT id, task_id, test_type, equipment_type, equipment_tag,
                            compliance_score, overall_confidence, verdict, rejection_reason,
                            extraction_payload, validation_payload, created_at, updated_at
                     FROM analyses WHERE id = ?1",
                    params![analysis_id.as_str()],
                    row_to_analysis,
                )
                .optional()
            })
            .map_err(|e| AnalysisStoreError::Io(e.to_string()))
    }

    async fn get_by_task(&self, task_id: TaskId) -> Result<Option<Analysis>, AnalysisStoreError> {
        self.handle
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT id, task_id, test_type, equipment_type, equipment_tag,
                            compliance_score, overall_confidence, verdict, rejection_reason,
                            extraction_payload, validation_payload, created_at, updated_at
                     FROM analyses WHERE task_id = ?1",
                    params![task_id.as_str()],
                    row_to_analysis,
                )
                .optional()
            })
            .map_err(|e| AnalysisStoreError::Io(e.to_string()))
    }

    async fn list(
        &self,
        owner: UserId,
        filter: &AnalysisFilter,
        sort_by: AnalysisSortBy,
        sort_order: SortOrder,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Analysis>, AnalysisStoreError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut predicate = String::from("tasks.owner_id = ?1");
        let mut binds: Vec<SqlValue> = vec![SqlValue::Text(owner.as_str())];

        if let Some(status) = filter.status_filter {
            binds.push(SqlValue::Text(verdict_to_text(status).to_string()));
            predicate.push_str(&format!(" AND analyses.verdict = ?{}", binds.len()));
        }
        if let Some(from) = filter.date_from {
            let encoded = encode_timestamp(from).map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
            binds.push(SqlValue::Text(encoded));
            predicate.push_str(&format!(" AND analyses.created_at >= ?{}", binds.len()));
        }
        if let Some(to) = filter.date_to {
            let encoded = encode_timestamp(to).map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
            binds.push(SqlValue::Text(encoded));
            predicate.push_str(&format!(" AND analyses.created_at <= ?{}", binds.len()));
        }

        let total: i64 = self
            .handle
            .with_connection(|conn| {
                let sql = format!(
                    "SELECT COUNT(*) FROM analyses
                     JOIN tasks ON analyses.task_id = tasks.id
                     WHERE {predicate}"
                );
                let bind_refs: Vec<&dyn ToSql> = binds.iter().map(|v| v as &dyn ToSql).collect();
                conn.query_row(&sql, bind_refs.as_slice(), |row| row.get(0))
            })
            .map_err(|e| AnalysisStoreError::Io(e.to_string()))?;

        let (sort_column, nulls_first) = match (sort_by, sort_order) {
            (AnalysisSortBy::CreatedAt, SortOrder::Asc) => ("analyses.created_at ASC", false),
            (AnalysisSortBy::CreatedAt, SortOrder::Desc) => ("analyses.created_at DESC", false),
            // Nulls sort last ascending, first descending (§4.10).
            (AnalysisSortBy::ComplianceScore, SortOrder::Asc) => {
                ("analyses.compliance_score ASC", false)
            }
            (AnalysisSortBy::ComplianceScore, SortOrder::Desc) => {
                ("analyses.compliance_score DESC", true)
            }
        };
        let null_order = if nulls_first {
            "compliance_score IS NOT NULL"
        } else {
            "compliance_score IS NULL"
        };

        let offset = i64::from(page - 1) * i64::from(per_page);
        let limit = i64::from(per_page);

        let items = self
            .handle
            .with_connection(|conn| {
                let sql = format!(
                    "SELECT analyses.id, analyses.task_id, analyses.test_type,
                            analyses.equipment_type, analyses.equipment_tag,
                            analyses.compliance_score, analyses.overall_confidence,
                            analyses.verdict, analyses.rejection_reason,
                            analyses.extraction_payload, analyses.validation_payload,
                            analyses.created_at, analyses.updated_at
                     FROM analyses
                     JOIN tasks ON analyses.task_id = tasks.id
                     WHERE {predicate}
                     ORDER BY {null_order}, {sort_column}
                     LIMIT {limit} OFFSET {offset}"
                );
                let bind_refs: Vec<&dyn ToSql> = binds.iter().map(|v| v as &dyn ToSql).collect();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(bind_refs.as_slice(), row_to_analysis)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| AnalysisStoreError::Io(e.to_string()))?;

        let total = u64::try_from(total).unwrap_or(0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "per_page is bounded by API-level validation well under u32::MAX"
        )]
        let total_pages = u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);

        Ok(Page {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }
}

fn insert_or_replace(handle: &SqliteHandle, analysis: &Analysis, is_create: bool) -> Result<(), AnalysisStoreError> {
    let created_at =
        encode_timestamp(analysis.created_at).map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
    let updated_at =
        encode_timestamp(analysis.updated_at).map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
    let extraction_payload = serde_json::to_string(&analysis.extraction_payload)
        .map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
    let validation_payload = serde_json::to_string(&analysis.validation_payload)
        .map_err(|e| AnalysisStoreError::Invalid(e.to_string()))?;
    let verdict = analysis.verdict.map(verdict_to_text);

    let sql = if is_create {
        "INSERT INTO analyses
            (id, task_id, test_type, equipment_type, equipment_tag, compliance_score,
             overall_confidence, verdict, rejection_reason, extraction_payload,
             validation_payload, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    } else {
        "UPDATE analyses SET
            test_type = ?3, equipment_type = ?4, equipment_tag = ?5, compliance_score = ?6,
            overall_confidence = ?7, verdict = ?8, rejection_reason = ?9,
            extraction_payload = ?10, validation_payload = ?11, updated_at = ?13
         WHERE id = ?1 AND task_id = ?2"
    };

    handle
        .with_connection(|conn| {
            conn.execute(
                sql,
                params![
                    analysis.id.as_str(),
                    analysis.task_id.as_str(),
                    test_type_to_text(analysis.test_type),
                    equipment_type_to_text(analysis.equipment_type),
                    analysis.equipment_tag,
                    analysis.compliance_score,
                    analysis.overall_confidence,
                    verdict,
                    analysis.rejection_reason,
                    extraction_payload,
                    validation_payload,
                    created_at,
                    updated_at,
                ],
            )
        })
        .map_err(|e| AnalysisStoreError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitgate_core::User;

    fn seed_user_and_task(handle: &SqliteHandle, owner_id: UserId, task_id: TaskId) {
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
                )
            })
            .expect("seed succeeds");
    }

    fn make_analysis(task_id: TaskId, score: f64) -> Analysis {
        let now = time::OffsetDateTime::now_utc();
        Analysis {
            id: AnalysisId::new(),
            task_id,
            test_type: TestType::Grounding,
            equipment_type: EquipmentType::Panel,
            equipment_tag: "PNL-1".to_string(),
            compliance_score: Some(score),
            overall_confidence: 0.9,
            verdict: Some(Verdict::Approved),
            rejection_reason: None,
            extraction_payload: serde_json::json!({}),
            validation_payload: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let owner_id = UserId::new();
        let task_id = TaskId::new();
        seed_user_and_task(&handle, owner_id, task_id);
        let store = SqliteAnalysisStore::new(handle);
        let analysis = make_analysis(task_id, 90.0);
        store.create(&analysis).await.expect("create succeeds");
        let loaded = store.get(analysis.id).await.expect("get succeeds");
        assert_eq!(loaded, Some(analysis));
    }

    #[tokio::test]
    async fn list_paginates_and_counts_consistently() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let owner_id = UserId::new();
        let store = SqliteAnalysisStore::new(handle.clone());
        for i in 0..5 {
            let task_id = TaskId::new();
            seed_user_for_task(&handle, owner_id, task_id, i);
            let analysis = make_analysis(task_id, f64::from(i) * 10.0);
            store.create(&analysis).await.expect("create succeeds");
        }

        let mut seen = 0u64;
        let mut page_number = 1;
        loop {
            let page = store
                .list(
                    owner_id,
                    &AnalysisFilter::default(),
                    AnalysisSortBy::CreatedAt,
                    SortOrder::Asc,
                    page_number,
                    2,
                )
                .await
                .expect("list succeeds");
            seen += page.items.len() as u64;
            if page_number >= page.total_pages {
                break;
            }
            page_number += 1;
        }
        assert_eq!(seen, 5);
    }

    fn seed_user_for_task(handle: &SqliteHandle, owner_id: UserId, task_id: TaskId, seq: i32) {
        let now = encode_timestamp(time::OffsetDateTime::now_utc()).expect("encodes");
        handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO users (id, email, password_hash, active, created_at)
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    params![owner_id.as_str(), format!("{owner_id}@example.com"), "hash", now],
                )?;
                conn.execute(
                    "INSERT INTO tasks
                        (id, owner_id, filename, object_key, byte_size, status, error_message,
                         created_at, updated_at)
                     VALUES (?1, ?2, ?3, 'key', 10, 'COMPLETED', NULL, ?4, ?4)",
                    params![task_id.as_str(), owner_id.as_str(), format!("f{seq}.pdf"), now],
                )
            })
            .expect("seed succeeds");
    }
}
