// circuitgate-api/src/routes/upload.rs
// ============================================================================
// Module: Upload Route
// Description: `POST /api/upload` — the Ingestion API (C11) exposed over
//              HTTP.
// Purpose: Stream a multipart file part straight into the Object Store in
//          bounded chunks, then persist a Task and enqueue its processing
//          job, per §4.1.
// Dependencies: circuitgate-core, axum-extra, tokio-util
// ============================================================================

//! ## Overview
//! The advertised-length check is enforced one layer up by
//! [`axum::extract::DefaultBodyLimit`] on the router; this handler enforces
//! the *actual* streamed-byte cap via [`circuitgate_core::ObjectStore::put_stream`],
//! which rejects mid-stream once `MAX_ARTIFACT_BYTES` is exceeded even if
//! a client lied about `Content-Length`.

use axum::Json;
use axum::extract::Multipart;
use axum::extract::State;
use circuitgate_core::AppError;
use circuitgate_core::MAX_ARTIFACT_BYTES;
use circuitgate_core::ObjectStoreError;
use circuitgate_core::Task;
use circuitgate_core::TaskId;
use circuitgate_core::TaskStatus;
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const ALLOWED_CONTENT_TYPES: [&str; 4] = ["application/pdf", "image/png", "image/jpeg", "image/tiff"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    task_id: String,
    status: TaskStatus,
}

/// `POST /api/upload` — streams a multipart `file` part to the Object
/// Store, persists a Task, and enqueues `process_document`.
///
/// # Errors
///
/// Returns [`ApiError`] with `400` for a missing/oversized/wrong-type
/// file, or `502` when the object store or broker fail.
pub async fn upload(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let field = loop {
        let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::coded(AppError::InvalidInput(e.to_string()), "UPLD_001"))?
        else {
            return Err(ApiError::coded(
                AppError::InvalidInput("multipart body has no \"file\" part".to_string()),
                "UPLD_002",
            ));
        };
        if field.name() == Some("file") {
            break field;
        }
    };

    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| ApiError::coded(AppError::InvalidInput("file part has no filename".to_string()), "UPLD_003"))?;
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::coded(
            AppError::InvalidInput(format!("unsupported content type: {content_type}")),
            "UPLD_004",
        ));
    }

    let task_id = TaskId::new();
    let object_key = format!("{task_id}/{filename}");
    let byte_stream = field.map_err(std::io::Error::other);
    let mut reader = StreamReader::new(byte_stream);
    let byte_size = state
        .object_store
        .put_stream(&object_key, &mut reader, MAX_ARTIFACT_BYTES)
        .await
        .map_err(|e| match e {
            ObjectStoreError::Write(message) => ApiError::coded(AppError::External(message), "UPLD_005"),
            ObjectStoreError::Read(message) => ApiError::coded(AppError::InvalidInput(message), "UPLD_006"),
            ObjectStoreError::NotFound(message) => ApiError::new(AppError::Internal(message)),
        })?;

    let now = time::OffsetDateTime::now_utc();
    let task = Task {
        id: task_id,
        owner_id: auth.id(),
        filename,
        object_key,
        byte_size,
        status: TaskStatus::Queued,
        error_message: None,
        created_at: now,
        updated_at: now,
    };
    state
        .task_store
        .create(&task)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?;

    if let Err(enqueue_err) = state.job_broker.enqueue_process_document(task_id).await {
        let reason = enqueue_err.to_string();
        let _ = state
            .task_store
            .compare_and_set_status(task_id, TaskStatus::Queued, TaskStatus::Failed, Some(&reason))
            .await;
        return Err(ApiError::coded(AppError::External(reason), "UPLD_007"));
    }

    Ok(Json(UploadResponse { task_id: task_id.to_string(), status: TaskStatus::Queued }))
}
