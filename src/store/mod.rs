//! Persistence boundary for users and password reset tokens.
//!
//! The auth core only talks to [`CredentialStore`]. [`PgStore`] is the
//! production implementation; [`MemoryStore`] backs unit and HTTP tests.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewUser, PasswordResetToken, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn CredentialStore>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Holds the constraint name when known.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Inserts a user. A duplicate email must surface as [`StoreError::UniqueViolation`].
    async fn create_user(&self, user: NewUser<'_>) -> Result<User, StoreError>;

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, StoreError>;

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError>;

    /// Atomically marks the token used and sets the owner's password hash.
    ///
    /// Returns `Ok(false)` without touching the password when the token was
    /// already used, so two racing callers can never both succeed.
    async fn consume_reset_token(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError>;
}
