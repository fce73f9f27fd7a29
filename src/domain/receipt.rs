//! Receipt domain types.
//!
//! These are the output of the extraction pipeline and the input of the
//! ledger store.

use serde::{Deserialize, Serialize};

/// A finalized purchase line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description with price and quantity columns removed.
    pub description: String,
}

impl LineItem {
    /// Creates a line item with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// One structured receipt extracted from a merchant email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Purchase date as rendered on the receipt, hyphen joined.
    pub purchase_date: String,
    /// Negated total with a period decimal separator, e.g. `-15.30`.
    pub total_amount: String,
    /// Items in receipt order. Never empty.
    pub line_items: Vec<LineItem>,
}

impl ReceiptRecord {
    /// Returns the item descriptions joined by newlines.
    ///
    /// This is the text attached as a note next to the amount in the ledger.
    pub fn items_note(&self) -> String {
        self.line_items
            .iter()
            .map(|item| item.description.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Records produced by one polling cycle, in mailbox order.
pub type PollingBatch = Vec<ReceiptRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_note_joins_descriptions() {
        let record = ReceiptRecord {
            purchase_date: "2019-09-30".to_string(),
            total_amount: "-3.20".to_string(),
            line_items: vec![LineItem::new("Duona 1kg"), LineItem::new("Pienas 2.5%")],
        };

        assert_eq!(record.items_note(), "Duona 1kg\nPienas 2.5%");
    }

    #[test]
    fn receipt_record_serialization() {
        let record = ReceiptRecord {
            purchase_date: "2019-09-30".to_string(),
            total_amount: "-15.30".to_string(),
            line_items: vec![LineItem::new("Bread 1kg")],
        };

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: ReceiptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, record);
    }
}
