//! Application wiring and lifecycle.
//!
//! [`App::connect`] turns loaded [`Settings`] into a running service graph:
//! credentials are acquired once, one Google session is shared by the Gmail
//! and Sheets clients, and the services are assembled on top.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::providers::email::{GmailMailbox, MailboxProvider};
use crate::providers::fortune::{FortuneCookieClient, FortuneSource};
use crate::providers::google::{GoogleCredentials, GoogleSession};
use crate::providers::ledger::{LedgerStore, SheetsLedger};
use crate::receipt::ReceiptExtractor;
use crate::services::{CycleService, NotificationService, PollingService, RetryPolicy, Scheduler};
use crate::storage::KeychainAccess;

/// The assembled application.
pub struct App {
    cycle: Arc<CycleService>,
    settings: Settings,
}

impl App {
    /// Builds the service graph on an authenticated session.
    pub fn new(session: Arc<GoogleSession>, settings: Settings) -> Result<Self> {
        let mailbox: Arc<dyn MailboxProvider> = Arc::new(
            GmailMailbox::new(Arc::clone(&session), &settings.mailbox.user_id)
                .context("creating Gmail mailbox")?,
        );
        let ledger: Arc<dyn LedgerStore> = Arc::new(
            SheetsLedger::new(session, &settings.ledger).context("creating Sheets ledger")?,
        );

        Self::with_providers(mailbox, ledger, settings)
    }

    /// Builds the service graph on the given providers.
    pub fn with_providers(
        mailbox: Arc<dyn MailboxProvider>,
        ledger: Arc<dyn LedgerStore>,
        settings: Settings,
    ) -> Result<Self> {
        let retry = RetryPolicy::from(&settings.retry);

        let fortune: Option<Arc<dyn FortuneSource>> = if settings.fortune.enabled {
            Some(Arc::new(
                FortuneCookieClient::new(&settings.fortune).context("creating fortune client")?,
            ))
        } else {
            None
        };

        let polling = PollingService::new(
            Arc::clone(&mailbox),
            ReceiptExtractor::new(settings.merchant.clone()),
            settings.mailbox.window,
            retry,
        );
        let notification =
            NotificationService::new(mailbox, fortune, settings.notification.clone(), retry);
        let cycle = Arc::new(CycleService::new(polling, ledger, notification, retry));

        Ok(Self { cycle, settings })
    }

    /// Acquires credentials, authenticates and builds the service graph.
    pub async fn connect(settings: Settings) -> Result<Self> {
        let credentials = load_credentials(&settings).await?;
        let session = GoogleSession::authenticate(credentials)
            .await
            .context("authenticating with Google")?;
        Self::new(Arc::new(session), settings)
    }

    /// The cycle service.
    pub fn cycle(&self) -> &CycleService {
        &self.cycle
    }

    /// A scheduler driving this application's cycles.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.cycle), self.settings.schedule.clone())
    }
}

/// Reads Google credentials from the configured file, or from the keychain.
pub async fn load_credentials(settings: &Settings) -> Result<GoogleCredentials> {
    if let Some(path) = &settings.google.credentials_file {
        tracing::debug!(path = %path.display(), "Reading Google credentials from file");
        return GoogleCredentials::from_file(path)
            .with_context(|| format!("reading credentials from {}", path.display()));
    }

    let account = &settings.google.keychain_account;
    KeychainAccess::new()
        .google_credentials(account)
        .await
        .with_context(|| {
            format!(
                "loading Google credentials for `{}` from the keychain (run `kvitas store-credentials <file>` first)",
                account
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::email::MockMailboxProvider;
    use crate::providers::ledger::MockLedgerStore;

    #[tokio::test]
    async fn credentials_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("google.json");
        std::fs::write(
            &path,
            r#"{"refresh_token":"r","client_id":"c","client_secret":"s"}"#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.google.credentials_file = Some(path);

        let credentials = load_credentials(&settings).await.unwrap();
        assert_eq!(credentials.client_id, "c");
    }

    #[tokio::test]
    async fn missing_credentials_file_is_reported() {
        let mut settings = Settings::default();
        settings.google.credentials_file = Some("/nonexistent/google.json".into());

        let err = load_credentials(&settings).await.unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/google.json"));
    }

    #[test]
    fn builds_with_fortune_disabled() {
        let mut settings = Settings::default();
        settings.fortune.enabled = false;

        let app = App::with_providers(
            Arc::new(MockMailboxProvider::new()),
            Arc::new(MockLedgerStore::new()),
            settings,
        );
        assert!(app.is_ok());
    }

    #[test]
    fn bad_fortune_url_fails_to_build() {
        let mut settings = Settings::default();
        settings.fortune.base_url = "::".to_string();

        let app = App::with_providers(
            Arc::new(MockMailboxProvider::new()),
            Arc::new(MockLedgerStore::new()),
            settings,
        );
        assert!(app.is_err());
    }
}
