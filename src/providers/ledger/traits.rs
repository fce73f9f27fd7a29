//! Ledger store trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::PollingBatch;
use crate::providers::Result;

/// Trait for the spreadsheet ledger that receipts are written to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Writes the receipts of `today` from `batch` into the ledger.
    ///
    /// Receipts with any other purchase date are ignored. Returns the number
    /// of receipts written.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`](crate::providers::ProviderError::NotFound)
    /// if the ledger has no cell for `today`.
    async fn write_batch(&self, batch: &PollingBatch, today: NaiveDate) -> Result<usize>;

    /// Reads the remaining balance of the week containing `today`.
    async fn weekly_balance(&self, today: NaiveDate) -> Result<String>;
}
