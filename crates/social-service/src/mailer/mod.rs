//! Outbound email.
//!
//! The registration flow only needs one message kind, the account
//! confirmation mail. [`EmailSender`] is the seam the saga depends on;
//! [`smtp::SmtpEmailSender`] delivers over SMTP and [`mock::MockEmailSender`]
//! records or fails on demand for tests.

pub mod mock;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockEmailSender;
pub use smtp::SmtpEmailSender;

/// Template used for account confirmation mails.
pub const CONFIRMATION_TEMPLATE: &str = "confirmation-email";

/// Subject of the account confirmation mail.
pub const CONFIRMATION_SUBJECT: &str = "Welcome to Social!";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData {
    pub username: String,
    pub activation_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: TemplateData,
}

impl OutgoingMail {
    /// Confirmation mail for a newly registered user.
    pub fn confirmation(to: &str, username: &str, activation_url: String) -> Self {
        Self {
            to: to.to_string(),
            subject: CONFIRMATION_SUBJECT.to_string(),
            template: CONFIRMATION_TEMPLATE.to_string(),
            data: TemplateData {
                username: username.to_string(),
                activation_url,
            },
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver `mail`. Any error means the mail must be treated as not sent.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Render the plain-text body for `mail`.
pub fn render_body(mail: &OutgoingMail) -> Result<String, MailError> {
    match mail.template.as_str() {
        CONFIRMATION_TEMPLATE => Ok(format!(
            "Hi {username},\n\n\
             Thanks for signing up for Social. Confirm your account by opening\n\
             the link below:\n\n\
             {url}\n\n\
             If you did not create an account you can ignore this email.\n",
            username = mail.data.username,
            url = mail.data.activation_url,
        )),
        other => Err(MailError::UnknownTemplate(other.to_string())),
    }
}
