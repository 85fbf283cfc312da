//! Email service for account notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Delivery
//! failures are reported to the caller, which logs them; a broken mail relay
//! never breaks the signup or reset flows for the user.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the signup confirmation email.
#[derive(Template)]
#[template(path = "email/signup_confirmation.html")]
struct SignupConfirmationHtml<'a> {
    shop_url: &'a str,
}

/// Plain text template for the signup confirmation email.
#[derive(Template)]
#[template(path = "email/signup_confirmation.txt")]
struct SignupConfirmationText<'a> {
    shop_url: &'a str,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    reset_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    reset_url: &'a str,
}

/// HTML template for the password changed notice.
#[derive(Template)]
#[template(path = "email/password_changed.html")]
struct PasswordChangedHtml<'a> {
    login_url: &'a str,
}

/// Plain text template for the password changed notice.
#[derive(Template)]
#[template(path = "email/password_changed.txt")]
struct PasswordChangedText<'a> {
    login_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay hostname is invalid.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url: base_url.to_string(),
        })
    }

    /// Send the welcome email after a successful signup.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_signup_confirmation(&self, to: &str) -> Result<(), EmailError> {
        let shop_url = self.base_url.as_str();
        let html = SignupConfirmationHtml { shop_url }.render()?;
        let text = SignupConfirmationText { shop_url }.render()?;

        self.send_multipart_email(to, "Welcome to Maplecart", &text, &html)
            .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), EmailError> {
        let reset_url = format!("{}/reset/{token}", self.base_url);
        let html = PasswordResetHtml {
            reset_url: &reset_url,
        }
        .render()?;
        let text = PasswordResetText {
            reset_url: &reset_url,
        }
        .render()?;

        self.send_multipart_email(to, "Reset your Maplecart password", &text, &html)
            .await
    }

    /// Send a notice that the account's password was changed.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_changed(&self, to: &str) -> Result<(), EmailError> {
        let login_url = format!("{}/login", self.base_url);
        let html = PasswordChangedHtml {
            login_url: &login_url,
        }
        .render()?;
        let text = PasswordChangedText {
            login_url: &login_url,
        }
        .render()?;

        self.send_multipart_email(to, "Your Maplecart password was changed", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
