//! SMTP delivery over `lettre`.

use super::{render_body, EmailSender, MailError, OutgoingMail};
use crate::config::MailConfig;
use async_trait::async_trait;
use common::secret::ExposeSecret;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::instrument;

/// Upper bound on one SMTP exchange.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build a STARTTLS relay to the configured host.
    ///
    /// No connection is opened until the first send.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("from address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Delivery(format!("invalid SMTP relay: {e}")))?
            .port(config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT));

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    #[instrument(skip_all, fields(template = %mail.template))]
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(mail)?)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        tracing::debug!(target: "social.mailer", "Mail handed to SMTP relay");
        Ok(())
    }
}
