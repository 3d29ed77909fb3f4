//! Session storage.
//!
//! At most one row exists per user. The upsert converges concurrent
//! resolutions on a single stored value (last writer wins — sessions are
//! equivalent resources from the agent's perspective, so this is not a
//! correctness-critical single-writer invariant), and the delete is
//! unconditional, so both operations are safe under queue redelivery.

use crate::error::SessionStoreError;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;

/// Trait for the user → session mapping.
///
/// This abstraction allows the dispatcher to be tested without Postgres.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the persisted session id for a user, if one exists.
    async fn find(&self, user_id: &str) -> Result<Option<String>, SessionStoreError>;

    /// Stores the session id for a user, replacing any existing row.
    ///
    /// Idempotent: redelivered attempts and concurrent resolutions converge
    /// on one stored value, last writer wins.
    async fn upsert(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError>;

    /// Deletes the row for a user.
    ///
    /// Idempotent: deleting an absent row is not an error.
    async fn delete(&self, user_id: &str) -> Result<(), SessionStoreError>;
}

/// Postgres-backed session store.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find(&self, user_id: &str) -> Result<Option<String>, SessionStoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT session_id
            FROM user_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionStoreError::LookupFailed {
            reason: e.to_string(),
        })?;

        Ok(row.map(|(session_id,)| session_id))
    }

    async fn upsert(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, session_id, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET session_id = EXCLUDED.session_id, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionStoreError::UpsertFailed {
            reason: e.to_string(),
        })?;

        tracing::debug!(user_id, "session upserted");
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), SessionStoreError> {
        sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionStoreError::DeleteFailed {
            reason: e.to_string(),
        })?;

        tracing::debug!(user_id, "session deleted");
        Ok(())
    }
}

/// In-memory session store for tests and local development.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, user_id: &str) -> Result<Option<String>, SessionStoreError> {
        Ok(self
            .sessions
            .lock()
            .expect("session map lock")
            .get(user_id)
            .cloned())
    }

    async fn upsert(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions
            .lock()
            .expect("session map lock")
            .insert(user_id.to_string(), session_id.to_string());
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), SessionStoreError> {
        self.sessions
            .lock()
            .expect("session map lock")
            .remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_find_missing() {
        let store = MemorySessionStore::new();
        assert_eq!(store.find("U1").await.expect("find"), None);
    }

    #[tokio::test]
    async fn memory_store_upsert_and_find() {
        let store = MemorySessionStore::new();
        store.upsert("U1", "sess-1").await.expect("upsert");
        assert_eq!(
            store.find("U1").await.expect("find"),
            Some("sess-1".to_string())
        );
    }

    #[tokio::test]
    async fn upsert_is_last_writer_wins() {
        let store = MemorySessionStore::new();
        store.upsert("U1", "sess-1").await.expect("upsert");
        store.upsert("U1", "sess-2").await.expect("upsert");
        assert_eq!(
            store.find("U1").await.expect("find"),
            Some("sess-2".to_string())
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemorySessionStore::new();
        store.upsert("U1", "sess-1").await.expect("upsert");
        store.delete("U1").await.expect("delete");
        store.delete("U1").await.expect("second delete");
        assert_eq!(store.find("U1").await.expect("find"), None);
    }
}
