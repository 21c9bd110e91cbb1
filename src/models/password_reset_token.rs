use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a stored reset token. A token string with no row is simply absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenState {
    Active,
    Consumed,
    Expired,
}

impl PasswordResetToken {
    /// Expiry wins over consumption: a used token past its window reports `Expired`.
    /// The token is still live at exactly `expires_at`.
    pub fn state(&self, now: DateTime<Utc>) -> ResetTokenState {
        if now > self.expires_at {
            ResetTokenState::Expired
        } else if self.used {
            ResetTokenState::Consumed
        } else {
            ResetTokenState::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token(used: bool, expires_at: DateTime<Utc>) -> PasswordResetToken {
        PasswordResetToken {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            token_hash: "digest".to_string(),
            used,
            expires_at,
            created_at: expires_at - Duration::hours(24),
            updated_at: expires_at - Duration::hours(24),
        }
    }

    #[test]
    fn state_transitions() {
        let expires_at = Utc::now();

        assert_eq!(token(false, expires_at).state(expires_at), ResetTokenState::Active);
        assert_eq!(token(true, expires_at).state(expires_at), ResetTokenState::Consumed);

        let later = expires_at + Duration::seconds(1);
        assert_eq!(token(false, expires_at).state(later), ResetTokenState::Expired);
        assert_eq!(token(true, expires_at).state(later), ResetTokenState::Expired);
    }
}
