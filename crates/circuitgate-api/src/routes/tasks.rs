// circuitgate-api/src/routes/tasks.rs
// ============================================================================
// Module: Task Routes
// Description: `GET /api/tasks/{id}`, `GET /api/tasks/{id}/result`.
// Purpose: Expose task status and the completed analysis once available,
//          with ownership enforcement (§6, §8 "Ownership safety").
// Dependencies: circuitgate-core, axum
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use circuitgate_core::Analysis;
use circuitgate_core::AppError;
use circuitgate_core::TaskId;
use circuitgate_core::TaskStatus;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TaskStatusBody {
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

async fn load_owned_task(state: &AppState, auth: &AuthUser, task_id: TaskId) -> Result<circuitgate_core::Task, ApiError> {
    let task = state
        .task_store
        .get(task_id)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?
        .ok_or_else(|| ApiError::new(AppError::NotFound(format!("task {task_id}"))))?;
    if task.owner_id != auth.id() {
        return Err(ApiError::new(AppError::Authorization));
    }
    Ok(task)
}

/// `GET /api/tasks/{id}` — current lifecycle status.
///
/// # Errors
///
/// Returns [`ApiError`] with `404` when the task doesn't exist, `403` when
/// it belongs to a different owner.
pub async fn status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<TaskStatusBody>, ApiError> {
    let task = load_owned_task(&state, &auth, task_id).await?;
    Ok(Json(TaskStatusBody { status: task.status, error_message: task.error_message }))
}

/// `GET /api/tasks/{id}/result` — the completed analysis, once available.
///
/// Returns `202` while the task is `QUEUED` or `PROCESSING`, `200` with the
/// analysis once `COMPLETED`.
///
/// # Errors
///
/// Returns [`ApiError`] with `404`/`403` per ownership, or `InvalidState`
/// translated to `400` if the task `FAILED` (the error message is carried
/// in the response).
pub async fn result(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<TaskId>,
) -> Result<(StatusCode, Json<Option<Analysis>>), ApiError> {
    let task = load_owned_task(&state, &auth, task_id).await?;
    match task.status {
        TaskStatus::Queued | TaskStatus::Processing => Ok((StatusCode::ACCEPTED, Json(None))),
        TaskStatus::Failed => Err(ApiError::new(AppError::InvalidState(
            task.error_message.unwrap_or_else(|| "task failed".to_string()),
        ))),
        TaskStatus::Completed => {
            let analysis = state
                .analysis_store
                .get_by_task(task_id)
                .await
                .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?
                .ok_or_else(|| ApiError::new(AppError::Internal("completed task has no analysis".to_string())))?;
            Ok((StatusCode::OK, Json(Some(analysis))))
        }
    }
}
