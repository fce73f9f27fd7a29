//! Mailbox provider implementations.
//!
//! This module contains the [`MailboxProvider`] trait and the Gmail backend:
//!
//! - [`GmailMailbox`] - Gmail REST API over a shared Google session
//!
//! The provider only moves bytes. It does not decode MIME, filter senders or
//! interpret receipts; that is the job of [`crate::receipt`].

mod gmail;
mod traits;

pub use gmail::GmailMailbox;
pub use traits::{MailboxProvider, OutgoingEmail};

#[cfg(test)]
pub use traits::MockMailboxProvider;
