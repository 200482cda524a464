// circuitgate-store/src/task_store.rs
// ============================================================================
// Module: SQLite Task Store
// Description: Durable TaskStore backed by SQLite.
// Purpose: Persist tasks and provide the compare-and-set status transition
//          the orchestrator relies on for idempotent re-entry.
// Dependencies: circuitgate-core, rusqlite
// ============================================================================

use async_trait::async_trait;
use circuitgate_core::Task;
use circuitgate_core::TaskId;
use circuitgate_core::TaskStatus;
use circuitgate_core::TaskStore;
use circuitgate_core::TaskStoreError;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::conn::SqliteHandle;
use crate::conn::decode_timestamp;
use crate::conn::encode_timestamp;

/// `SQLite`-backed [`TaskStore`].
#[derive(Clone)]
pub struct SqliteTaskStore {
    handle: SqliteHandle,
}

impl SqliteTaskStore {
    /// Wraps a shared connection handle.
    #[must_use]
    pub fn new(handle: SqliteHandle) -> Self {
        Self { handle }
    }
}

fn status_to_text(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Queued => "QUEUED",
        TaskStatus::Processing => "PROCESSING",
        TaskStatus::Completed => "COMPLETED",
        TaskStatus::Failed => "FAILED",
    }
}

fn status_from_text(text: &str) -> Result<TaskStatus, TaskStoreError> {
    match text {
        "QUEUED" => Ok(TaskStatus::Queued),
        "PROCESSING" => Ok(TaskStatus::Processing),
        "COMPLETED" => Ok(TaskStatus::Completed),
        "FAILED" => Ok(TaskStatus::Failed),
        other => Err(TaskStoreError::Invalid(format!("unknown task status: {other}"))),
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(Task {
        id: id.parse().map_err(|_| rusqlite::Error::InvalidColumnType(
            0,
            "id".to_string(),
            rusqlite::types::Type::Text,
        ))?,
        owner_id: owner_id.parse().map_err(|_| rusqlite::Error::InvalidColumnType(
            0,
            "owner_id".to_string(),
            rusqlite::types::Type::Text,
        ))?,
        filename: row.get("filename")?,
        object_key: row.get("object_key")?,
        byte_size: row.get::<_, i64>("byte_size")?.try_into().unwrap_or(0),
        status: status_from_text(&status).map_err(|_| rusqlite::Error::InvalidColumnType(
            0,
            "status".to_string(),
            rusqlite::types::Type::Text,
        ))?,
        error_message: row.get("error_message")?,
        created_at: decode_timestamp(&created_at).map_err(|_| rusqlite::Error::InvalidColumnType(
            0,
            "created_at".to_string(),
            rusqlite::types::Type::Text,
        ))?,
        updated_at: decode_timestamp(&updated_at).map_err(|_| rusqlite::Error::InvalidColumnType(
            0,
            "updated_at".to_string(),
            rusqlite::types::Type::Text,
        ))?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, task: &Task) -> Result<(), TaskStoreError> {
        let created_at = encode_timestamp(task.created_at)
            .map_err(|e| TaskStoreError::Invalid(e.to_string()))?;
        let updated_at = encode_timestamp(task.updated_at)
            .map_err(|e| TaskStoreError::Invalid(e.to_string()))?;
        let byte_size: i64 = task
            .byte_size
            .try_into()
            .map_err(|_| TaskStoreError::Invalid("byte_size overflows i64".to_string()))?;
        self.handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO tasks
                        (id, owner_id, filename, object_key, byte_size, status,
                         error_message, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        task.id.as_str(),
                        task.owner_id.as_str(),
                        task.filename,
                        task.object_key,
                        byte_size,
                        status_to_text(task.status),
                        task.error_message,
                        created_at,
                        updated_at,
                    ],
                )
            })
            .map_err(|e| TaskStoreError::Io(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, task_id: TaskId) -> Result<Option<Task>, TaskStoreError> {
        let task = self
            .handle
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT id, owner_id, filename, object_key, byte_size, status,
                            error_message, created_at, updated_at
                     FROM tasks WHERE id = ?1",
                    params![task_id.as_str()],
                    row_to_task,
                )
                .optional()
            })
            .map_err(|e| TaskStoreError::Io(e.to_string()))?;
        Ok(task)
    }

    async fn compare_and_set_status(
        &self,
        task_id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
        error_message: Option<&str>,
    ) -> Result<bool, TaskStoreError> {
        if !expected.can_transition_to(next) {
            return Err(TaskStoreError::Conflict(format!(
                "illegal transition {expected:?} -> {next:?}"
            )));
        }
        let now = encode_timestamp(time::OffsetDateTime::now_utc())
            .map_err(|e| TaskStoreError::Invalid(e.to_string()))?;
        let rows_changed = self
            .handle
            .with_connection(|conn| {
                conn.execute(
                    "UPDATE tasks SET status = ?1, error_message = ?2, updated_at = ?3
                     WHERE id = ?4 AND status = ?5",
                    params![
                        status_to_text(next),
                        error_message,
                        now,
                        task_id.as_str(),
                        status_to_text(expected),
                    ],
                )
            })
            .map_err(|e| TaskStoreError::Io(e.to_string()))?;
        Ok(rows_changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitgate_core::UserId;

    fn make_task(owner_id: UserId) -> Task {
        let now = time::OffsetDateTime::now_utc();
        Task {
            id: TaskId::new(),
            owner_id,
            filename: "report.pdf".to_string(),
            object_key: "key/report.pdf".to_string(),
            byte_size: 1024,
            status: TaskStatus::Queued,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let owner_id = UserId::new();
        seed_user(&handle, owner_id);
        let store = SqliteTaskStore::new(handle);
        let task = make_task(owner_id);
        store.create(&task).await.expect("create succeeds");
        let loaded = store.get(task.id).await.expect("get succeeds");
        assert_eq!(loaded, Some(task));
    }

    #[tokio::test]
    async fn compare_and_set_rejects_when_status_has_moved_on() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let owner_id = UserId::new();
        seed_user(&handle, owner_id);
        let store = SqliteTaskStore::new(handle);
        let task = make_task(owner_id);
        store.create(&task).await.expect("create succeeds");

        let first = store
            .compare_and_set_status(task.id, TaskStatus::Queued, TaskStatus::Processing, None)
            .await
            .expect("cas succeeds");
        assert!(first);

        let second = store
            .compare_and_set_status(task.id, TaskStatus::Queued, TaskStatus::Processing, None)
            .await
            .expect("cas succeeds");
        assert!(!second, "a racing worker observing a non-QUEUED status must no-op");
    }

    fn seed_user(handle: &SqliteHandle, owner_id: UserId) {
        let now = encode_timestamp(time::OffsetDateTime::now_utc()).expect("encodes");
        handle
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO users (id, email, password_hash, active, created_at)
                     VALUES (?1, ?2, ?3, 1, ?4)",
                    params![owner_id.as_str(), format!("{owner_id}@example.com"), "hash", now],
                )
            })
            .expect("seed user succeeds");
    }
}
