//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`.
//!
//! This is a server-rendered shop, so error responses follow page semantics
//! rather than API semantics: missing resources redirect to the shop index,
//! missing authentication redirects to the login page, and only genuine
//! server faults show the error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::filters;
use crate::services::auth::AuthError;
use crate::services::payments::PaymentError;
use crate::services::uploads::UploadError;

/// Application-level error type for the shop.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Upload handling failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        // Repository lookups that miss behave like any other missing page
        match e {
            RepositoryError::NotFound => Self::NotFound("entity".to_owned()),
            other => Self::Database(other),
        }
    }
}

/// Error page shown for server faults.
#[derive(Template, WebTemplate)]
#[template(path = "error/500.html")]
struct Error500Template {
    authenticated: bool,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) | Self::Payment(_) => true,
            Self::Auth(e) => matches!(e, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Upload(e) => matches!(e, UploadError::Io(_)),
            Self::NotFound(_) | Self::Unauthorized(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );

            let page = Error500Template {
                authenticated: false,
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, page).into_response();
        }

        match self {
            Self::NotFound(_) => Redirect::to("/").into_response(),
            Self::Unauthorized(_) => Redirect::to("/login").into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Auth(e) => auth_error_response(&e),
            Self::Upload(_) => {
                (StatusCode::BAD_REQUEST, "Unsupported image type".to_owned()).into_response()
            }
            // server errors already handled above
            Self::Database(_) | Self::Session(_) | Self::Internal(_) | Self::Payment(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Responses for auth errors that escape the form handlers.
///
/// The login and signup handlers re-render their forms for the expected
/// cases, so anything reaching here just falls back to the relevant page.
fn auth_error_response(e: &AuthError) -> Response {
    match e {
        AuthError::InvalidCredentials
        | AuthError::InvalidResetToken
        | AuthError::UserAlreadyExists => Redirect::to("/login").into_response(),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()).into_response(),
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_owned()).into_response()
        }
        AuthError::Repository(_) | AuthError::PasswordHash => {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_not_found_redirects_to_index() {
        let response = AppError::NotFound("test".to_string()).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(LOCATION).map(|v| v.as_bytes()), Some(&b"/"[..]));
    }

    #[test]
    fn test_unauthorized_redirects_to_login() {
        let response = AppError::Unauthorized("test".to_string()).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(LOCATION).map(|v| v.as_bytes()),
            Some(&b"/login"[..])
        );
    }

    #[test]
    fn test_repository_not_found_becomes_redirect() {
        let err: AppError = RepositoryError::NotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_bad_request_status() {
        let response = AppError::BadRequest("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
