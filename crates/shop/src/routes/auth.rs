//! Authentication route handlers.
//!
//! Login, signup, logout and the email-driven password reset flow. Form
//! validation failures re-render the form with the submitted email kept and
//! a 422 status; one-shot flash messages carry notices across redirects.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{clear_session, set_current_user};
use crate::middleware::session::{set_flash, take_flash};
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ResetRequestForm {
    pub email: String,
}

/// New password form data; the token rides along as a hidden field.
#[derive(Debug, Deserialize)]
pub struct NewPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub authenticated: bool,
    pub error: Option<String>,
    pub flash: Option<String>,
    pub email: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub authenticated: bool,
    pub error: Option<String>,
    pub email: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub authenticated: bool,
    pub flash: Option<String>,
    pub email: String,
}

/// New password page template, reached from the emailed reset link.
#[derive(Template, WebTemplate)]
#[template(path = "auth/new_password.html")]
pub struct NewPasswordTemplate {
    pub authenticated: bool,
    pub error: Option<String>,
    pub token: String,
}

fn unprocessable(template: impl IntoResponse) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(session))]
pub async fn login_page(session: Session) -> Result<LoginTemplate> {
    let flash = take_flash(&session).await?;

    Ok(LoginTemplate {
        authenticated: false,
        error: None,
        flash,
        email: String::new(),
    })
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
            };
            set_current_user(&session, &current).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));

            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok(unprocessable(LoginTemplate {
            authenticated: false,
            error: Some("Invalid email or password.".to_owned()),
            flash: None,
            email: form.email,
        })),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
#[instrument]
pub async fn signup_page() -> SignupTemplate {
    SignupTemplate {
        authenticated: false,
        error: None,
        email: String::new(),
    }
}

/// Handle signup form submission.
///
/// On success, sends the welcome email in the background and redirects to
/// login with a flash. Email delivery failures are logged and never shown.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let rerender = |error: String, email: String| {
        unprocessable(SignupTemplate {
            authenticated: false,
            error: Some(error),
            email,
        })
    };

    if form.password != form.password_confirm {
        return Ok(rerender("Passwords do not match.".to_owned(), form.email));
    }

    match state.auth().register(&form.email, &form.password).await {
        Ok(user) => {
            let email_service = state.email().clone();
            let to = user.email.as_str().to_owned();
            tokio::spawn(async move {
                if let Err(e) = email_service.send_signup_confirmation(&to).await {
                    tracing::warn!(error = %e, "Failed to send signup confirmation");
                }
            });

            set_flash(&session, "Account created, you can log in now.").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::UserAlreadyExists) => Ok(rerender(
            "An account with this email already exists.".to_owned(),
            form.email,
        )),
        Err(AuthError::InvalidEmail(_)) => Ok(rerender(
            "Please enter a valid email address.".to_owned(),
            form.email,
        )),
        Err(AuthError::WeakPassword(msg)) => Ok(rerender(msg, form.email)),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout: destroy the session entirely.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_session(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
#[instrument(skip(session))]
pub async fn reset_page(session: Session) -> Result<ResetTemplate> {
    let flash = take_flash(&session).await?;

    Ok(ResetTemplate {
        authenticated: false,
        flash,
        email: String::new(),
    })
}

/// Handle forgot password form submission.
///
/// Shows the same flash whether or not the email has an account, so the form
/// cannot be used to discover which emails are registered. The reset email is
/// sent in the background.
#[instrument(skip(state, session, form))]
pub async fn request_reset(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetRequestForm>,
) -> Result<Redirect> {
    if let Some((user, token)) = state.auth().issue_reset_token(&form.email).await? {
        let email_service = state.email().clone();
        let to = user.email.as_str().to_owned();
        tokio::spawn(async move {
            if let Err(e) = email_service.send_password_reset(&to, &token).await {
                tracing::warn!(error = %e, "Failed to send password reset email");
            }
        });
    }

    set_flash(
        &session,
        "If an account exists for that email, a reset link is on its way.",
    )
    .await?;

    Ok(Redirect::to("/reset"))
}

/// Display the new password page behind an emailed reset link.
///
/// Unknown or expired tokens bounce back to the forgot password page with a
/// flash instead of revealing anything about the token.
#[instrument(skip(state, session))]
pub async fn new_password_page(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response> {
    match state.auth().user_for_reset_token(&token).await {
        Ok(_) => Ok(NewPasswordTemplate {
            authenticated: false,
            error: None,
            token,
        }
        .into_response()),
        Err(AuthError::InvalidResetToken) => {
            set_flash(&session, "That reset link is invalid or has expired.").await?;
            Ok(Redirect::to("/reset").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle new password form submission, consuming the reset token.
///
/// A "password changed" notice is sent in the background on success; delivery
/// failures are logged and never shown.
#[instrument(skip(state, session, form))]
pub async fn new_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response> {
    let rerender = |error: String, token: String| {
        unprocessable(NewPasswordTemplate {
            authenticated: false,
            error: Some(error),
            token,
        })
    };

    if form.password != form.password_confirm {
        return Ok(rerender("Passwords do not match.".to_owned(), form.token));
    }

    match state.auth().reset_password(&form.token, &form.password).await {
        Ok(user) => {
            let email_service = state.email().clone();
            let to = user.email.as_str().to_owned();
            tokio::spawn(async move {
                if let Err(e) = email_service.send_password_changed(&to).await {
                    tracing::warn!(error = %e, "Failed to send password changed notice");
                }
            });

            set_flash(&session, "Password updated, you can log in now.").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::WeakPassword(msg)) => Ok(rerender(msg, form.token)),
        Err(AuthError::InvalidResetToken) => {
            set_flash(&session, "That reset link is invalid or has expired.").await?;
            Ok(Redirect::to("/reset").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
