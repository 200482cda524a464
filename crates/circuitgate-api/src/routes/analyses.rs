// circuitgate-api/src/routes/analyses.rs
// ============================================================================
// Module: Analysis Routes
// Description: The Review API (C12) exposed over HTTP: list, detail,
//              approve, reject, audit, report.
// Purpose: Enforce ownership and the verdict-transition preconditions from
//          §4.10 at the HTTP boundary.
// Dependencies: circuitgate-core, axum
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Response;
use circuitgate_core::Analysis;
use circuitgate_core::AnalysisFilter;
use circuitgate_core::AnalysisId;
use circuitgate_core::AnalysisSortBy;
use circuitgate_core::AppError;
use circuitgate_core::AuditEvent;
use circuitgate_core::AuditEventType;
use circuitgate_core::Finding;
use circuitgate_core::Page;
use circuitgate_core::SortOrder;
use circuitgate_core::TaskStatus;
use circuitgate_core::Verdict;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::report_adapter;
use crate::state::AppState;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 20;
const MIN_REJECTION_REASON_LEN: usize = 10;
const MAX_REJECTION_REASON_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<u32>,
    per_page: Option<u32>,
    status_filter: Option<Verdict>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    date_from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    date_to: Option<OffsetDateTime>,
    sort_by: Option<AnalysisSortBy>,
    sort_order: Option<SortOrder>,
}

/// `GET /api/analyses` — a paged, filtered, sorted listing owned by the
/// caller.
///
/// # Errors
///
/// Returns [`ApiError`] on a store failure.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Analysis>>, ApiError> {
    let filter = AnalysisFilter {
        status_filter: query.status_filter,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = state
        .analysis_store
        .list(
            auth.id(),
            &filter,
            query.sort_by.unwrap_or(AnalysisSortBy::CreatedAt),
            query.sort_order.unwrap_or(SortOrder::Desc),
            query.page.unwrap_or(DEFAULT_PAGE).max(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
        )
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;
    Ok(Json(page))
}

async fn load_owned_analysis(state: &AppState, auth: &AuthUser, analysis_id: AnalysisId) -> Result<Analysis, ApiError> {
    load_owned_analysis_with_task(state, auth, analysis_id).await.map(|(analysis, _)| analysis)
}

async fn load_owned_analysis_with_task(
    state: &AppState,
    auth: &AuthUser,
    analysis_id: AnalysisId,
) -> Result<(Analysis, circuitgate_core::Task), ApiError> {
    let analysis = state
        .analysis_store
        .get(analysis_id)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?
        .ok_or_else(|| ApiError::new(AppError::NotFound(format!("analysis {analysis_id}"))))?;
    let task = state
        .task_store
        .get(analysis.task_id)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?
        .ok_or_else(|| ApiError::new(AppError::NotFound(format!("analysis {analysis_id}"))))?;
    if task.owner_id != auth.id() {
        return Err(ApiError::new(AppError::Authorization));
    }
    Ok((analysis, task))
}

/// `GET /api/analyses/{id}` — analysis detail.
///
/// # Errors
///
/// Returns [`ApiError`] with `404`/`403` per ownership.
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(analysis_id): Path<AnalysisId>,
) -> Result<Json<Analysis>, ApiError> {
    let analysis = load_owned_analysis(&state, &auth, analysis_id).await?;
    Ok(Json(analysis))
}

#[derive(Debug, Serialize)]
pub struct VerdictBody {
    verdict: Verdict,
}

/// `PUT /api/analyses/{id}/approve` — sets the verdict to `APPROVED`.
///
/// # Errors
///
/// Returns [`ApiError`] with `400` if the task is not `COMPLETED` or the
/// verdict is already `APPROVED`, or `404`/`403` per ownership.
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(analysis_id): Path<AnalysisId>,
) -> Result<Json<VerdictBody>, ApiError> {
    let (mut analysis, task) = load_owned_analysis_with_task(&state, &auth, analysis_id).await?;
    check_review_preconditions(&analysis, &task, Verdict::Approved)?;
    analysis.verdict = Some(Verdict::Approved);
    analysis.updated_at = OffsetDateTime::now_utc();
    state
        .analysis_store
        .update(&analysis)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;

    let event = AuditEvent {
        id: circuitgate_core::AuditEventId::new(),
        analysis_id,
        event_type: AuditEventType::HumanReviewApproved,
        event_timestamp: OffsetDateTime::now_utc(),
        model_version: None,
        prompt_version: None,
        rule_id: None,
        confidence_score: None,
        details: serde_json::json!({ "reviewer_id": auth.id().to_string() }),
    };
    if let Err(e) = state.audit_store.append(&event).await {
        state.diagnostics.warn(&format!("audit append failed for analysis {analysis_id}: {e}"));
    }

    Ok(Json(VerdictBody { verdict: Verdict::Approved }))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    reason: String,
}

/// `PUT /api/analyses/{id}/reject` — sets the verdict to `REJECTED` with a
/// stored reason.
///
/// # Errors
///
/// Returns [`ApiError`] with `400` if the task is not `COMPLETED`, the
/// verdict is already `REJECTED`, or the reason length is outside
/// `[10, 1000]`, or `404`/`403` per ownership.
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(analysis_id): Path<AnalysisId>,
    Json(body): Json<RejectBody>,
) -> Result<Json<VerdictBody>, ApiError> {
    let reason_len = body.reason.chars().count();
    if !(MIN_REJECTION_REASON_LEN..=MAX_REJECTION_REASON_LEN).contains(&reason_len) {
        return Err(ApiError::coded(
            AppError::InvalidInput(format!(
                "reason must be between {MIN_REJECTION_REASON_LEN} and {MAX_REJECTION_REASON_LEN} characters"
            )),
            "VALD_001",
        ));
    }
    let (mut analysis, task) = load_owned_analysis_with_task(&state, &auth, analysis_id).await?;
    check_review_preconditions(&analysis, &task, Verdict::Rejected)?;
    analysis.verdict = Some(Verdict::Rejected);
    analysis.rejection_reason = Some(body.reason.clone());
    analysis.updated_at = OffsetDateTime::now_utc();
    state
        .analysis_store
        .update(&analysis)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;

    let event = AuditEvent {
        id: circuitgate_core::AuditEventId::new(),
        analysis_id,
        event_type: AuditEventType::HumanReviewRejected,
        event_timestamp: OffsetDateTime::now_utc(),
        model_version: None,
        prompt_version: None,
        rule_id: None,
        confidence_score: None,
        details: serde_json::json!({ "reviewer_id": auth.id().to_string(), "reason": body.reason }),
    };
    if let Err(e) = state.audit_store.append(&event).await {
        state.diagnostics.warn(&format!("audit append failed for analysis {analysis_id}: {e}"));
    }

    Ok(Json(VerdictBody { verdict: Verdict::Rejected }))
}

/// Enforces §4.10's approve/reject preconditions: the owning task must be
/// `COMPLETED`, and the mutation must not already be in effect — reject is
/// blocked only once the verdict is already `REJECTED`, approve only once
/// it is already `APPROVED` (§8 scenario 6: a REVIEW-or-APPROVED analysis
/// may still be rejected; only a *repeated* reject of an already-`REJECTED`
/// analysis is `InvalidState`, and symmetrically for approve).
fn check_review_preconditions(analysis: &Analysis, task: &circuitgate_core::Task, outcome: Verdict) -> Result<(), ApiError> {
    if task.status != TaskStatus::Completed {
        return Err(ApiError::new(AppError::InvalidState("task is not yet completed".to_string())));
    }
    if analysis.verdict == Some(outcome) {
        return Err(ApiError::new(AppError::InvalidState(
            "analysis verdict is already set to the requested outcome".to_string(),
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AuditBody {
    events: Vec<AuditEvent>,
    event_count: usize,
}

/// `GET /api/analyses/{id}/audit` — the full audit trail, in timestamp
/// order.
///
/// # Errors
///
/// Returns [`ApiError`] with `404`/`403` per ownership.
pub async fn audit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(analysis_id): Path<AnalysisId>,
) -> Result<Json<AuditBody>, ApiError> {
    load_owned_analysis(&state, &auth, analysis_id).await?;
    let events = state
        .audit_store
        .list_by_analysis(analysis_id)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;
    let event_count = events.len();
    Ok(Json(AuditBody { events, event_count }))
}

/// `GET /api/analyses/{id}/report` — rendered report bytes (PDF).
///
/// # Errors
///
/// Returns [`ApiError`] with `404`/`403` per ownership, or `502` if the
/// external renderer fails and the analysis is not yet `COMPLETED`.
pub async fn report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(analysis_id): Path<AnalysisId>,
) -> Result<Response, ApiError> {
    let (analysis, task) = load_owned_analysis_with_task(&state, &auth, analysis_id).await?;
    if task.status != TaskStatus::Completed {
        return Err(ApiError::new(AppError::InvalidState("analysis is not yet completed".to_string())));
    }
    let findings: Vec<Finding> = state
        .finding_store
        .list_by_analysis(analysis_id)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;
    let bundle = report_adapter::from_analysis(&analysis, &findings);
    let bytes = state
        .report_renderer
        .render(&bundle)
        .await
        .map_err(|e| ApiError::new(AppError::External(e.to_string())))?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use circuitgate_core::AnalysisId;
    use circuitgate_core::EquipmentType;
    use circuitgate_core::TaskId;
    use circuitgate_core::TestType;
    use circuitgate_core::UserId;
    use time::OffsetDateTime;

    use super::*;

    fn analysis_with_verdict(verdict: Option<Verdict>) -> Analysis {
        let now = OffsetDateTime::now_utc();
        Analysis {
            id: AnalysisId::new(),
            task_id: TaskId::new(),
            test_type: TestType::Grounding,
            equipment_type: EquipmentType::Panel,
            equipment_tag: "PANEL-1".to_string(),
            compliance_score: Some(90.0),
            overall_confidence: 0.9,
            verdict,
            rejection_reason: None,
            extraction_payload: serde_json::Value::Null,
            validation_payload: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    fn completed_task() -> circuitgate_core::Task {
        let now = OffsetDateTime::now_utc();
        circuitgate_core::Task {
            id: TaskId::new(),
            owner_id: UserId::new(),
            filename: "report.pdf".to_string(),
            object_key: "k".to_string(),
            byte_size: 10,
            status: TaskStatus::Completed,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reject_succeeds_from_an_auto_computed_approved_verdict() {
        // §8 scenario 6: a completed analysis the system approved can
        // still be rejected by a reviewer.
        let analysis = analysis_with_verdict(Some(Verdict::Approved));
        let task = completed_task();
        assert!(check_review_preconditions(&analysis, &task, Verdict::Rejected).is_ok());
    }

    #[test]
    fn repeated_reject_on_an_already_rejected_analysis_is_invalid_state() {
        let analysis = analysis_with_verdict(Some(Verdict::Rejected));
        let task = completed_task();
        let err = check_review_preconditions(&analysis, &task, Verdict::Rejected).unwrap_err();
        assert_eq!(err.source.status_code(), 400);
    }

    #[test]
    fn repeated_approve_on_an_already_approved_analysis_is_invalid_state() {
        let analysis = analysis_with_verdict(Some(Verdict::Approved));
        let task = completed_task();
        assert!(check_review_preconditions(&analysis, &task, Verdict::Approved).is_err());
    }

    #[test]
    fn approve_from_review_verdict_succeeds() {
        let analysis = analysis_with_verdict(Some(Verdict::Review));
        let task = completed_task();
        assert!(check_review_preconditions(&analysis, &task, Verdict::Approved).is_ok());
    }

    #[test]
    fn review_actions_are_rejected_while_the_task_is_not_completed() {
        let analysis = analysis_with_verdict(Some(Verdict::Review));
        let mut task = completed_task();
        task.status = TaskStatus::Processing;
        assert!(check_review_preconditions(&analysis, &task, Verdict::Approved).is_err());
    }
}
