//! Spreadsheet ledger.
//!
//! - [`LedgerStore`] - the trait the cycle writes receipts through
//! - [`SheetsLedger`] - Google Sheets implementation
//! - [`grid`] - A1 cell arithmetic and layout lookups

pub mod grid;
mod sheets;
mod traits;

pub use sheets::{day_label, month_tab, SheetsLedger};
pub use traits::LedgerStore;

#[cfg(test)]
pub use traits::MockLedgerStore;
