//! Credential storage.
//!
//! Google OAuth credentials live in the OS keychain. Blocking keychain calls
//! run on `tokio::task::spawn_blocking`.

mod keychain;

pub use keychain::{KeychainAccess, KeychainError};
