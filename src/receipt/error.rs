//! Extraction error types.
//!
//! A message either is not a receipt at all ([`SkipReason`]) or claims to be
//! one but does not have the expected layout ([`MalformedReceipt`]). Neither
//! aborts a polling cycle.

/// Why a message was excluded before receipt parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// The transport encoding is not valid base64url.
    #[error("body is not valid base64url: {0}")]
    InvalidBase64(String),

    /// The decoded bytes are not UTF-8.
    #[error("decoded body is not valid UTF-8")]
    InvalidUtf8,

    /// The MIME structure could not be parsed.
    #[error("MIME parse failed: {0}")]
    Mime(String),

    /// No `From` header, or one without an `<address>`.
    #[error("no From header with an angle-bracket address")]
    MissingSender,

    /// The message comes from someone other than the merchant.
    #[error("sender {0} is not the merchant")]
    SenderMismatch(String),
}

/// Why a merchant message did not yield a receipt record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReceipt {
    /// The message has no `text/html` part.
    #[error("no text/html part")]
    NoHtmlPart,

    /// The HTML part has fewer than two `<pre>` blocks.
    #[error("expected at least 2 <pre> blocks, found {found}")]
    MissingPreBlocks {
        /// Number of `<pre>` blocks present.
        found: usize,
    },

    /// The receipt body is too short to hold a date line.
    #[error("receipt body has {lines} line(s), too short to carry a date")]
    TooShort {
        /// Number of body lines after the header.
        lines: usize,
    },

    /// The date line does not have enough tokens.
    #[error("date line {line:?} has too few tokens")]
    MissingDate {
        /// The offending line.
        line: String,
    },

    /// No line carries the amount-due marker.
    #[error("no amount due line")]
    MissingTotal,

    /// Not a single priced item was found.
    #[error("no line items")]
    NoLineItems,
}

/// Outcome of a failed extraction for one message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The message is not a receipt.
    #[error("skipped: {0}")]
    Skipped(#[from] SkipReason),

    /// The message is a receipt but could not be parsed.
    #[error("malformed receipt: {0}")]
    Malformed(#[from] MalformedReceipt),
}
