//! In-process [`EmailSender`] for tests and local runs.

use super::{EmailSender, MailError, OutgoingMail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records every mail it accepts; can be switched to fail every send.
#[derive(Default)]
pub struct MockEmailSender {
    fail: AtomicBool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MockEmailSender {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::default();
        sender.set_failing(true);
        sender
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `send` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Mails accepted so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn last_sent(&self) -> Option<OutgoingMail> {
        self.sent().pop()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Delivery("mock sender configured to fail".to_string()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail::confirmation("bob@x.com", "bob", "http://x/confirm/t".to_string())
    }

    #[tokio::test]
    async fn test_accepting_sender_records_mail() {
        let sender = MockEmailSender::accepting();

        sender.send(&mail()).await.unwrap();

        assert_eq!(sender.attempts(), 1);
        assert_eq!(sender.last_sent(), Some(mail()));
    }

    #[tokio::test]
    async fn test_failing_sender_counts_attempt_but_records_nothing() {
        let sender = MockEmailSender::failing();

        assert!(sender.send(&mail()).await.is_err());
        assert_eq!(sender.attempts(), 1);
        assert!(sender.sent().is_empty());
    }
}
