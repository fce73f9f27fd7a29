//! Mailbox provider trait definition.
//!
//! This module defines the [`MailboxProvider`] trait which abstracts over the
//! mail backend. The polling service lists and fetches receipts through it, and
//! the notification service sends the daily summary through it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{MessageRef, RawMessage};
use crate::providers::Result;

/// A plain-text email to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Email subject.
    pub subject: String,
    /// Plain text body.
    pub body_text: String,
}

/// Trait for mailbox backends.
///
/// # Example
///
/// ```ignore
/// async fn newest(mailbox: &dyn MailboxProvider) -> Result<Vec<RawMessage>> {
///     let mut raw = Vec::new();
///     for message in mailbox.list_recent(30).await? {
///         raw.push(mailbox.fetch_raw(&message).await?);
///     }
///     Ok(raw)
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    /// Lists the most recent messages, newest first.
    ///
    /// Returns at most `limit` references. No filtering happens here; the
    /// sender filter is applied after decoding.
    async fn list_recent(&self, limit: u32) -> Result<Vec<MessageRef>>;

    /// Fetches one message in raw, base64url-encoded form.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`](crate::providers::ProviderError::NotFound)
    /// if the message disappeared between listing and fetching.
    async fn fetch_raw(&self, message: &MessageRef) -> Result<RawMessage>;

    /// Sends an email.
    ///
    /// Returns the provider-assigned message ID.
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}
