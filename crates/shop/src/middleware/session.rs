//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! cookie is signed with a key derived from the configured session secret;
//! the sessions table lives in its own store-managed schema and
//! `create_session_layer` runs the store's migration on startup.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, cookie::Key};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ShopConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mc_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Errors building the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionSetupError {
    /// Session store migration failed.
    #[error("session store migration failed: {0}")]
    Migration(#[from] sqlx::Error),

    /// The configured secret cannot be used as a signing key.
    #[error("session secret is not a valid signing key: {0}")]
    InvalidSecret(String),
}

/// Derive the cookie signing key from the configured session secret.
///
/// The key needs at least 64 bytes of material; configuration loading
/// enforces that minimum.
fn signing_key(secret: &SecretString) -> Result<Key, SessionSetupError> {
    Key::try_from(secret.expose_secret().as_bytes())
        .map_err(|e| SessionSetupError::InvalidSecret(e.to_string()))
}

/// Create the session layer with `PostgreSQL` store and a signed cookie.
///
/// # Errors
///
/// Returns an error if the session store migration fails or the configured
/// secret is too short to sign cookies with.
pub async fn create_session_layer(
    pool: &PgPool,
    config: &ShopConfig,
) -> Result<
    SessionManagerLayer<PostgresStore, tower_sessions::service::SignedCookie>,
    SessionSetupError,
> {
    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;

    let key = signing_key(&config.session_secret)?;

    // Secure cookies only when actually served over HTTPS
    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

/// Push a one-shot flash message into the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(
    session: &tower_sessions::Session,
    message: &str,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(crate::models::session_keys::FLASH, message)
        .await
}

/// Take the flash message out of the session, if any.
///
/// The message is removed as it is read; a page refresh shows it only once.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_flash(
    session: &tower_sessions::Session,
) -> Result<Option<String>, tower_sessions::session::Error> {
    session
        .remove::<String>(crate::models::session_keys::FLASH)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_accepts_minimum_length_secret() {
        let secret = SecretString::from("a".repeat(64));
        assert!(signing_key(&secret).is_ok());
    }

    #[test]
    fn test_signing_key_rejects_short_secret() {
        let secret = SecretString::from("a".repeat(32));
        assert!(matches!(
            signing_key(&secret),
            Err(SessionSetupError::InvalidSecret(_))
        ));
    }
}
