// circuitgate-store/src/user_store.rs
// ============================================================================
// Module: SQLite User Store
// Description: Durable UserStore backed by SQLite.
// Purpose: Persist the auth subsystem's User entity so ownership checks in
//          the ingestion/review API are exercisable end-to-end.
// Dependencies: circuitgate-core, rusqlite
// ============================================================================

use async_trait::async_trait;
use circuitgate_core::User;
use circuitgate_core::UserId;
use circuitgate_core::UserStore;
use circuitgate_core::UserStoreError;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::conn::SqliteHandle;
use crate::conn::decode_timestamp;
use crate::conn::encode_timestamp;

/// `SQLite`-backed [`UserStore`].
#[derive(Clone)]
pub struct SqliteUserStore {
    handle: SqliteHandle,
}

impl SqliteUserStore {
    /// Wraps a shared connection handle.
    #[must_use]
    pub fn new(handle: SqliteHandle) -> Self {
        Self { handle }
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    Ok(User {
        id: id
            .parse()
            .map_err(|_| rusqlite::Error::InvalidColumnType(0, "id".to_string(), rusqlite::types::Type::Text))?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        active: row.get::<_, i64>("active")? != 0,
        created_at: decode_timestamp(&created_at).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "created_at".to_string(), rusqlite::types::Type::Text)
        })?,
    })
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, user: &User) -> Result<(), UserStoreError> {
        let created_at =
            encode_timestamp(user.created_at).map_err(|e| UserStoreError::Io(e.to_string()))?;
        let result = self.handle.with_connection(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.as_str(),
                    user.email,
                    user.password_hash,
                    i64::from(user.active),
                    created_at,
                ],
            )
        });
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(UserStoreError::DuplicateEmail(user.email.clone()))
            }
            Err(e) => Err(UserStoreError::Io(e.to_string())),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        self.handle
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT id, email, password_hash, active, created_at
                     FROM users WHERE email = ?1",
                    params![email],
                    row_to_user,
                )
                .optional()
            })
            .map_err(|e| UserStoreError::Io(e.to_string()))
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>, UserStoreError> {
        self.handle
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT id, email, password_hash, active, created_at
                     FROM users WHERE id = ?1",
                    params![user_id.as_str()],
                    row_to_user,
                )
                .optional()
            })
            .map_err(|e| UserStoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user() -> User {
        User {
            id: UserId::new(),
            email: "tester@example.com".to_string(),
            password_hash: "argon2-hash".to_string(),
            active: true,
            created_at: time::OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn create_then_lookup_by_email_round_trips() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let store = SqliteUserStore::new(handle);
        let user = make_user();
        store.create(&user).await.expect("create succeeds");
        let loaded = store
            .get_by_email(&user.email)
            .await
            .expect("lookup succeeds");
        assert_eq!(loaded, Some(user));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let handle = SqliteHandle::open_in_memory().expect("opens");
        let store = SqliteUserStore::new(handle);
        let user = make_user();
        store.create(&user).await.expect("first create succeeds");
        let mut duplicate = make_user();
        duplicate.id = UserId::new();
        duplicate.email = user.email.clone();
        let result = store.create(&duplicate).await;
        assert!(matches!(result, Err(UserStoreError::DuplicateEmail(_))));
    }
}
