use chrono::Duration;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::password::{PasswordError, PasswordHasher};
use crate::clock::SharedClock;
use crate::models::{PasswordResetToken, ResetTokenState, User};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("user not found")]
    UserNotFound,
    #[error("reset token not found")]
    TokenNotFound,
    #[error("reset token has expired")]
    TokenExpired,
    #[error("reset token has already been used")]
    TokenAlreadyUsed,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Only this digest is persisted; the raw token is handed out once.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issues single-use password reset tokens and redeems them.
pub struct ResetTokenManager {
    store: SharedStore,
    hasher: PasswordHasher,
    clock: SharedClock,
    ttl: Duration,
}

impl ResetTokenManager {
    pub fn new(
        store: SharedStore,
        hasher: PasswordHasher,
        clock: SharedClock,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            ttl,
        }
    }

    /// Creates an active token for the account behind `email` and returns the raw value.
    pub async fn request_reset(&self, email: &str) -> Result<String, ResetError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(ResetError::UserNotFound)?;

        let token = generate_token();
        let expires_at = self.clock.now() + self.ttl;
        self.store
            .create_reset_token(user.id, &hash_token(&token), expires_at)
            .await?;

        Ok(token)
    }

    /// Resolves an active token to its owner without consuming it.
    pub async fn inspect(&self, token: &str) -> Result<User, ResetError> {
        let record = self.find_active(token).await?;
        self.store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(ResetError::UserNotFound)
    }

    /// Spends the token and sets the owner's password. Returns the owner's id.
    pub async fn confirm_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Uuid, ResetError> {
        let record = self.find_active(token).await?;
        let password_hash = self.hasher.hash(new_password)?;

        let consumed = self
            .store
            .consume_reset_token(record.id, record.user_id, &password_hash)
            .await?;
        if !consumed {
            // Another request spent it between our read and the write.
            return Err(ResetError::TokenAlreadyUsed);
        }

        Ok(record.user_id)
    }

    async fn find_active(&self, token: &str) -> Result<PasswordResetToken, ResetError> {
        let record = self
            .store
            .find_reset_token(&hash_token(token))
            .await?
            .ok_or(ResetError::TokenNotFound)?;

        match record.state(self.clock.now()) {
            ResetTokenState::Active => Ok(record),
            ResetTokenState::Expired => Err(ResetError::TokenExpired),
            ResetTokenState::Consumed => Err(ResetError::TokenAlreadyUsed),
        }
    }
}
