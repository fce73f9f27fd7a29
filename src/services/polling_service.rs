//! Polling service.
//!
//! One poll lists the newest messages, fetches each one in turn and runs it
//! through the [`ReceiptExtractor`]. Messages from other senders are skipped
//! quietly; merchant messages that do not parse are skipped with a warning.
//! Neither stops the poll.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::RetryPolicy;
use crate::domain::{MessageRef, PollingBatch, RawMessage};
use crate::providers::email::MailboxProvider;
use crate::providers::ProviderError;
use crate::receipt::{ExtractError, ReceiptExtractor};

/// Result of one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Records built, in mailbox order.
    pub batch: PollingBatch,
    /// Messages listed.
    pub messages_seen: usize,
    /// Messages skipped before parsing (foreign sender, undecodable, vanished).
    pub skipped: usize,
    /// Merchant messages whose receipt did not parse.
    pub malformed: usize,
}

/// Polls the mailbox for receipts.
pub struct PollingService {
    mailbox: Arc<dyn MailboxProvider>,
    extractor: ReceiptExtractor,
    window: u32,
    retry: RetryPolicy,
}

impl PollingService {
    /// Creates a polling service reading the newest `window` messages.
    pub fn new(
        mailbox: Arc<dyn MailboxProvider>,
        extractor: ReceiptExtractor,
        window: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            mailbox,
            extractor,
            window,
            retry,
        }
    }

    /// Runs one poll.
    ///
    /// # Errors
    ///
    /// Fails if listing fails, or if a fetch fails for a reason other than
    /// the message having vanished, once retries are used up.
    pub async fn poll(&self) -> Result<PollOutcome> {
        let messages = self
            .retry
            .run("list messages", || self.mailbox.list_recent(self.window))
            .await
            .context("listing recent messages")?;

        let mut outcome = PollOutcome {
            messages_seen: messages.len(),
            ..PollOutcome::default()
        };

        for message in &messages {
            let Some(raw) = self.fetch(message).await? else {
                outcome.skipped += 1;
                continue;
            };

            match self.extractor.extract(&raw) {
                Ok(record) => {
                    tracing::debug!(
                        message_id = %raw.id,
                        date = %record.purchase_date,
                        items = record.line_items.len(),
                        "Receipt parsed"
                    );
                    outcome.batch.push(record);
                }
                Err(ExtractError::Skipped(reason)) => {
                    tracing::debug!(message_id = %raw.id, reason = %reason, "Skipping message");
                    outcome.skipped += 1;
                }
                Err(ExtractError::Malformed(error)) => {
                    tracing::warn!(message_id = %raw.id, error = %error, "Malformed receipt skipped");
                    outcome.malformed += 1;
                }
            }
        }

        tracing::info!(
            seen = outcome.messages_seen,
            receipts = outcome.batch.len(),
            skipped = outcome.skipped,
            malformed = outcome.malformed,
            "Poll finished"
        );
        Ok(outcome)
    }

    /// Fetches one message. A message deleted since listing yields `None`.
    async fn fetch(&self, message: &MessageRef) -> Result<Option<RawMessage>> {
        let fetched = self
            .retry
            .run("fetch message", || self.mailbox.fetch_raw(message))
            .await;

        match fetched {
            Ok(raw) => Ok(Some(raw)),
            Err(ProviderError::NotFound(_)) => {
                tracing::warn!(message_id = %message.id, "Message vanished before fetch");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("fetching message {}", message.id)),
        }
    }
}
