use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::clock::{SharedClock, SystemClock};
use crate::models::{NewUser, PasswordResetToken, User};

/// In-process store with the same uniqueness and atomicity rules as the
/// Postgres schema. One lock guards both tables.
pub struct MemoryStore {
    inner: Mutex<Tables>,
    clock: SharedClock,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    reset_tokens: HashMap<Uuid, PasswordResetToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Timestamps written by the store come from `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            inner: Mutex::new(Tables::default()),
            clock,
        }
    }

    /// Snapshot of every reset token issued to `user_id`.
    pub async fn reset_tokens_for(&self, user_id: Uuid) -> Vec<PasswordResetToken> {
        let tables = self.inner.lock().await;
        tables
            .reset_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.inner.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.inner.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser<'_>) -> Result<User, StoreError> {
        let mut tables = self.inner.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = self.clock.now();
        let record = User {
            id: Uuid::now_v7(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            first_name: user.first_name.to_string(),
            last_name: user.last_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, StoreError> {
        let mut tables = self.inner.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        if tables.reset_tokens.values().any(|t| t.token_hash == token_hash) {
            return Err(StoreError::UniqueViolation(
                "password_reset_tokens_token_hash_key".to_string(),
            ));
        }

        let now = self.clock.now();
        let record = PasswordResetToken {
            id: Uuid::now_v7(),
            user_id,
            token_hash: token_hash.to_string(),
            used: false,
            expires_at,
            created_at: now,
            updated_at: now,
        };
        tables.reset_tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        let tables = self.inner.lock().await;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut guard = self.inner.lock().await;
        let tables = &mut *guard;
        let now = self.clock.now();

        match tables.reset_tokens.get(&token_id) {
            Some(token) if !token.used => {}
            Some(_) => return Ok(false),
            None => return Err(StoreError::Database(sqlx::Error::RowNotFound)),
        }

        // Check the user before mutating anything so a failure leaves both tables untouched.
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        };
        user.password_hash = password_hash.to_string();
        user.updated_at = now;

        if let Some(token) = tables.reset_tokens.get_mut(&token_id) {
            token.used = true;
            token.updated_at = now;
        }
        Ok(true)
    }
}
