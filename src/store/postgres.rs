use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::db;
use crate::models::{NewUser, PasswordResetToken, User};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::UniqueViolation(db_err.constraint().unwrap_or("unknown").to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(db::users::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(db::users::find_by_id(&self.pool, id).await?)
    }

    async fn create_user(&self, user: NewUser<'_>) -> Result<User, StoreError> {
        db::users::create(&self.pool, user).await.map_err(classify)
    }

    async fn create_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetToken, StoreError> {
        db::password_reset_tokens::create(&self.pool, user_id, token_hash, expires_at)
            .await
            .map_err(classify)
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(db::password_reset_tokens::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn consume_reset_token(
        &self,
        token_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The conditional update takes the row lock, so a concurrent consumer
        // blocks here and then sees used = true.
        if !db::password_reset_tokens::mark_used(&mut *tx, token_id).await? {
            tx.rollback().await?;
            return Ok(false);
        }

        if db::users::update_password(&mut *tx, user_id, password_hash).await? == 0 {
            tx.rollback().await?;
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        tx.commit().await?;
        Ok(true)
    }
}
