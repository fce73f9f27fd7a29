//! Receipt record construction.

use super::classifier::assemble;
use super::html::{preformatted_blocks, receipt_lines};
use super::MalformedReceipt;
use crate::config::ReceiptFormat;
use crate::domain::{DecodedDocument, ReceiptRecord};

/// Index of the `<pre>` block holding the receipt body.
const RECEIPT_BLOCK_INDEX: usize = 1;

/// Builds a receipt record from a decoded merchant message.
pub fn build_record(
    doc: &DecodedDocument,
    format: &ReceiptFormat,
) -> Result<ReceiptRecord, MalformedReceipt> {
    let html = doc
        .first_part("text/html")
        .ok_or(MalformedReceipt::NoHtmlPart)?;

    let blocks = preformatted_blocks(&html.payload);
    let block = blocks
        .get(RECEIPT_BLOCK_INDEX)
        .ok_or(MalformedReceipt::MissingPreBlocks {
            found: blocks.len(),
        })?;

    record_from_lines(&receipt_lines(block), format)
}

/// Builds a receipt record from receipt body lines (header already dropped).
pub fn record_from_lines(
    lines: &[&str],
    format: &ReceiptFormat,
) -> Result<ReceiptRecord, MalformedReceipt> {
    let purchase_date = purchase_date(lines, format)?;
    let assembled = assemble(lines.iter().copied(), format);

    let total_amount = assembled
        .total_amount
        .ok_or(MalformedReceipt::MissingTotal)?
        .replace(',', ".");

    if assembled.line_items.is_empty() {
        return Err(MalformedReceipt::NoLineItems);
    }

    Ok(ReceiptRecord {
        purchase_date,
        total_amount,
        line_items: assembled.line_items,
    })
}

/// Reads the purchase date from the second-to-last body line.
///
/// The date tokens are joined with hyphens as they appear; no reformatting.
fn purchase_date(lines: &[&str], format: &ReceiptFormat) -> Result<String, MalformedReceipt> {
    if lines.len() < 2 {
        return Err(MalformedReceipt::TooShort { lines: lines.len() });
    }
    let line = lines[lines.len() - 2];

    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .get(format.date_token_start..format.date_token_end)
        .map(|date| date.join("-"))
        .ok_or_else(|| MalformedReceipt::MissingDate {
            line: line.to_string(),
        })
}
