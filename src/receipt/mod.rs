//! Receipt extraction pipeline.
//!
//! Converts a raw merchant email into a [`ReceiptRecord`]:
//!
//! ```text
//! RawMessage ──decode──> DecodedDocument ──<pre> #2──> lines ──classify/assemble──> ReceiptRecord
//! ```
//!
//! - [`decoder`] - base64url + MIME decoding and the sender filter
//! - [`html`] - `<pre>` block extraction
//! - [`classifier`] - per-line classification and item assembly
//! - [`builder`] - date, total and item list into one record
//!
//! Every step is a pure function of its input. The same message always
//! yields the same record or the same error.

pub mod builder;
pub mod classifier;
pub mod decoder;
mod error;
pub mod html;

pub use builder::{build_record, record_from_lines};
pub use classifier::{assemble, classify, Assembled, LineKind};
pub use decoder::decode;
pub use error::{ExtractError, MalformedReceipt, SkipReason};

use crate::config::MerchantSettings;
use crate::domain::{RawMessage, ReceiptRecord};

/// Extracts receipt records from raw messages of one merchant.
#[derive(Debug, Clone)]
pub struct ReceiptExtractor {
    merchant: MerchantSettings,
}

impl ReceiptExtractor {
    /// Creates an extractor for the given merchant.
    pub fn new(merchant: MerchantSettings) -> Self {
        Self { merchant }
    }

    /// Returns the merchant this extractor accepts.
    pub fn merchant(&self) -> &MerchantSettings {
        &self.merchant
    }

    /// Runs the whole pipeline on one raw message.
    pub fn extract(&self, raw: &RawMessage) -> Result<ReceiptRecord, ExtractError> {
        let doc = decode(raw, &self.merchant.sender_address)?;
        tracing::debug!(message_id = %raw.id, "Got receipt, parsing");
        Ok(build_record(&doc, &self.merchant.format)?)
    }
}
