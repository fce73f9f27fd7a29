//! External service providers.
//!
//! This module contains provider traits and implementations for the services
//! around the receipt pipeline:
//!
//! - [`google`] - OAuth session shared by the Gmail and Sheets clients
//! - [`email`] - the mailbox receipts are read from and summaries sent through
//! - [`ledger`] - the spreadsheet ledger receipts are written to
//! - [`fortune`] - the fortune-of-the-day source

mod error;
pub mod email;
pub mod fortune;
pub mod google;
pub mod ledger;

pub use error::{ProviderError, Result};
