//! Domain layer types for kvitas.
//!
//! This module contains the core domain types used throughout the crate:
//! raw and decoded mailbox messages on the way in, and receipt records on the
//! way out to the ledger.

mod message;
mod receipt;
mod types;

pub use message::{BodyPart, DecodedDocument, MessageRef, RawMessage};
pub use receipt::{LineItem, PollingBatch, ReceiptRecord};
pub use types::MessageId;
