//! kvitas - receipt tracking for a weekly spreadsheet budget
//!
//! This crate extracts itemized purchases from merchant receipt emails and
//! records them in a Google Sheets ledger. The extraction pipeline lives in
//! [`receipt`]; [`providers`] talks to Gmail, Sheets and the fortune site;
//! [`services`] runs the daily cycle.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod receipt;
pub mod services;
pub mod storage;

pub use app::App;
