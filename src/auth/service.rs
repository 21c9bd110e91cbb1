use chrono::Duration;
use uuid::Uuid;

use crate::auth::jwt::{TokenError, TokenService};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::reset::{ResetError, ResetTokenManager};
use crate::clock::SharedClock;
use crate::config::AuthConfig;
use crate::models::{NewUser, PublicUser};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email already exists")]
    EmailAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid bearer token: {0}")]
    Token(#[from] TokenError),
    #[error("invalid reset token")]
    ResetTokenNotFound,
    #[error("reset token has expired")]
    ResetTokenExpired,
    #[error("reset token has already been used")]
    ResetTokenAlreadyUsed,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ResetError> for AuthError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::UserNotFound => AuthError::UserNotFound,
            ResetError::TokenNotFound => AuthError::ResetTokenNotFound,
            ResetError::TokenExpired => AuthError::ResetTokenExpired,
            ResetError::TokenAlreadyUsed => AuthError::ResetTokenAlreadyUsed,
            ResetError::Password(e) => AuthError::Password(e),
            ResetError::Store(e) => AuthError::Store(e),
        }
    }
}

/// What a successful login hands back.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: PublicUser,
}

/// Registration, login, profile lookup and the password reset flow.
pub struct AuthService {
    store: SharedStore,
    hasher: PasswordHasher,
    tokens: TokenService,
    resets: ResetTokenManager,
    token_ttl: Duration,
    /// Verified against when the email is unknown, so a failed login costs
    /// one Argon2 run whether or not the account exists.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        store: SharedStore,
        hasher: PasswordHasher,
        clock: SharedClock,
        config: &AuthConfig,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, clock.clone());
        let resets = ResetTokenManager::new(
            store.clone(),
            hasher.clone(),
            clock,
            config.reset_token_ttl,
        );

        let dummy_hash = match hasher.hash("keystone-login-timing-equalizer") {
            Ok(digest) => digest,
            Err(e) => {
                tracing::warn!("Failed to prepare dummy password hash: {e}");
                String::new()
            }
        };

        Self {
            store,
            hasher,
            tokens,
            resets,
            token_ttl: config.token_ttl,
            dummy_hash,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<PublicUser, AuthError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hasher.hash(password)?;

        // The pre-check above can race; the unique index is the real guard.
        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash: &password_hash,
                first_name,
                last_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AuthError::EmailAlreadyExists,
                other => AuthError::Store(other),
            })?;

        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            let _ = self.hasher.verify(password, &self.dummy_hash);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, self.token_ttl)?;
        Ok(LoginOutcome {
            token,
            user: user.into(),
        })
    }

    /// Resolves a bearer token to the user id it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        Ok(self.tokens.validate(token)?)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Starts a reset. An unknown email is not an error here: it yields `None`
    /// so callers answer both cases the same way.
    pub async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        match self.resets.request_reset(email).await {
            Ok(token) => Ok(Some(token)),
            Err(ResetError::UserNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn inspect_reset_token(&self, token: &str) -> Result<PublicUser, AuthError> {
        Ok(self.resets.inspect(token).await?.into())
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Uuid, AuthError> {
        Ok(self.resets.confirm_reset(token, new_password).await?)
    }
}
