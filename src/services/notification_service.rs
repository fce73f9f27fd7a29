//! Daily summary notification.
//!
//! After each cycle a short plain-text email reports the remaining weekly
//! balance, followed by a fortune of the day when one can be fetched.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::RetryPolicy;
use crate::config::NotificationSettings;
use crate::providers::email::{MailboxProvider, OutgoingEmail};
use crate::providers::fortune::FortuneSource;

/// Composes the summary body.
///
/// The fortune line is left out entirely when there is no fortune.
pub fn summary_text(balance: &str, fortune: Option<&str>) -> String {
    let mut text = format!("Labas,\nSavaitės likutis: {}", balance);
    if let Some(fortune) = fortune {
        text.push_str(&format!("\n\nŠios dienos palinkėjimas: {}", fortune));
    }
    text
}

/// Sends the daily summary email.
pub struct NotificationService {
    mailbox: Arc<dyn MailboxProvider>,
    fortune: Option<Arc<dyn FortuneSource>>,
    settings: NotificationSettings,
    retry: RetryPolicy,
}

impl NotificationService {
    /// Creates the service. Without a fortune source the summary has no fortune line.
    pub fn new(
        mailbox: Arc<dyn MailboxProvider>,
        fortune: Option<Arc<dyn FortuneSource>>,
        settings: NotificationSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            mailbox,
            fortune,
            settings,
            retry,
        }
    }

    /// Fetches a fortune, or `None` if the source is missing or fails.
    async fn fortune(&self) -> Option<String> {
        let source = self.fortune.as_ref()?;
        match source.fetch().await {
            Ok(fortune) => Some(fortune),
            Err(e) => {
                tracing::warn!(error = %e, "No fortune today");
                None
            }
        }
    }

    /// Sends the summary for `balance`.
    ///
    /// Returns the sent message ID, or `None` when notifications are disabled.
    pub async fn send_summary(&self, balance: &str) -> Result<Option<String>> {
        if !self.settings.enabled {
            tracing::debug!("Notifications disabled, summary not sent");
            return Ok(None);
        }

        let fortune = self.fortune().await;
        let email = OutgoingEmail {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            subject: self.settings.subject.clone(),
            body_text: summary_text(balance, fortune.as_deref()),
        };

        let id = self
            .retry
            .run("send summary", || self.mailbox.send(&email))
            .await
            .context("sending daily summary")?;

        tracing::info!(message_id = %id, to = %email.to, "Daily summary sent");
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::email::MockMailboxProvider;
    use crate::providers::fortune::MockFortuneSource;
    use crate::providers::ProviderError;
    use pretty_assertions::assert_eq;

    fn settings() -> NotificationSettings {
        NotificationSettings {
            enabled: true,
            from: "kvitas@example.com".to_string(),
            to: "me@example.com".to_string(),
            ..NotificationSettings::default()
        }
    }

    #[test]
    fn summary_with_fortune() {
        assert_eq!(
            summary_text("12.50", Some("Good things are coming.")),
            "Labas,\nSavaitės likutis: 12.50\n\nŠios dienos palinkėjimas: Good things are coming."
        );
    }

    #[test]
    fn summary_without_fortune() {
        assert_eq!(summary_text("-3,20", None), "Labas,\nSavaitės likutis: -3,20");
    }

    #[tokio::test]
    async fn sends_summary_with_fortune() {
        let mut mailbox = MockMailboxProvider::new();
        mailbox
            .expect_send()
            .withf(|email| {
                email.to == "me@example.com"
                    && email.subject == "FINANSAI: Likęs balansas savaitei"
                    && email.body_text.ends_with("palinkėjimas: Smile.")
            })
            .times(1)
            .returning(|_| Ok("sent-1".to_string()));

        let mut fortune = MockFortuneSource::new();
        fortune
            .expect_fetch()
            .returning(|| Ok("Smile.".to_string()));

        let service = NotificationService::new(
            Arc::new(mailbox),
            Some(Arc::new(fortune)),
            settings(),
            RetryPolicy::none(),
        );

        assert_eq!(
            service.send_summary("12.50").await.unwrap(),
            Some("sent-1".to_string())
        );
    }

    #[tokio::test]
    async fn fortune_failure_still_sends() {
        let mut mailbox = MockMailboxProvider::new();
        mailbox
            .expect_send()
            .withf(|email| email.body_text == "Labas,\nSavaitės likutis: 12.50")
            .times(1)
            .returning(|_| Ok("sent-2".to_string()));

        let mut fortune = MockFortuneSource::new();
        fortune
            .expect_fetch()
            .returning(|| Err(ProviderError::NotFound("no fortune".to_string())));

        let service = NotificationService::new(
            Arc::new(mailbox),
            Some(Arc::new(fortune)),
            settings(),
            RetryPolicy::none(),
        );

        assert!(service.send_summary("12.50").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn disabled_notifications_send_nothing() {
        let mut mailbox = MockMailboxProvider::new();
        mailbox.expect_send().times(0);

        let service = NotificationService::new(
            Arc::new(mailbox),
            None,
            NotificationSettings {
                enabled: false,
                ..settings()
            },
            RetryPolicy::none(),
        );

        assert_eq!(service.send_summary("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn send_failure_is_an_error() {
        let mut mailbox = MockMailboxProvider::new();
        mailbox
            .expect_send()
            .returning(|_| Err(ProviderError::Authentication("revoked".to_string())));

        let service =
            NotificationService::new(Arc::new(mailbox), None, settings(), RetryPolicy::none());

        let err = service.send_summary("1").await.unwrap_err();
        assert!(err.to_string().contains("sending daily summary"));
    }
}
