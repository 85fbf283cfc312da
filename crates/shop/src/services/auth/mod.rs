//! Authentication service.
//!
//! Password signup/login plus the email-driven password reset flow. Password
//! hashing uses Argon2id with per-hash random salts.

mod error;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use maplecart_core::Email;

pub use error::AuthError;

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a password reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Authentication service backed by the user repository.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email,
    /// `AuthError::WeakPassword` for a too-short password,
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let hash = hash_password(password)?;

        let repo = UserRepository::new(&self.pool);
        match repo.create_with_password(&email, &hash).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Conflict(_)) => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and return the account.
    ///
    /// Unknown emails and wrong passwords both report `InvalidCredentials` so
    /// login cannot be used to discover which emails have accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email or password does
    /// not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let repo = UserRepository::new(&self.pool);
        let user = repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = repo
            .get_password_hash(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issue a fresh password reset token for the account, if it exists.
    ///
    /// Returns `None` for unknown emails; callers show the same message
    /// either way so the flow does not reveal which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a query fails.
    pub async fn issue_reset_token(&self, email: &str) -> Result<Option<(User, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let repo = UserRepository::new(&self.pool);
        let Some(user) = repo.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        repo.set_reset_token(user.id, &token, expires_at).await?;

        Ok(Some((user, token)))
    }

    /// Look up the account behind a reset token, rejecting expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or past
    /// its expiry.
    pub async fn user_for_reset_token(&self, token: &str) -> Result<User, AuthError> {
        let repo = UserRepository::new(&self.pool);

        let row = repo
            .get_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if row.is_expired(Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }

        repo.get_by_id(row.user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }

    /// Set a new password via a reset token, consuming the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or
    /// expired, `AuthError::WeakPassword` for a too-short password.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<User, AuthError> {
        validate_password(password)?;

        let user = self.user_for_reset_token(token).await?;
        let hash = hash_password(password)?;

        let repo = UserRepository::new(&self.pool);
        repo.set_password_hash(user.id, &hash).await?;
        repo.clear_reset_token(user.id).await?;

        Ok(user)
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
fn verify_password(hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Generate a 64-character hex reset token from 32 random bytes.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password(&hash, "correct horse battery").unwrap());
        assert!(!verify_password(&hash, "wrong password").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_password_length_boundary() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_reset_token_format() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
