//! User account models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use maplecart_core::{Email, UserId};

/// A registered shop user.
///
/// The password hash lives in a separate table and is never part of this
/// struct, so it cannot leak through logging or serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An outstanding password reset token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Whether the token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use maplecart_core::UserId;

    fn token_expiring_at(expires_at: DateTime<Utc>) -> PasswordResetToken {
        PasswordResetToken {
            user_id: UserId::new(1),
            token: "ab".repeat(32),
            expires_at,
        }
    }

    #[test]
    fn test_token_within_expiry_is_valid() {
        let now = Utc::now();
        let token = token_expiring_at(now + Duration::hours(1));
        assert!(!token.is_expired(now));
    }

    #[test]
    fn test_token_past_expiry_is_rejected() {
        let now = Utc::now();
        let token = token_expiring_at(now - Duration::seconds(1));
        assert!(token.is_expired(now));
    }

    #[test]
    fn test_token_at_exact_expiry_is_rejected() {
        let now = Utc::now();
        let token = token_expiring_at(now);
        assert!(token.is_expired(now));
    }
}
