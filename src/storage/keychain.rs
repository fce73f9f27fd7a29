//! Keychain access for secure credential storage.
//!
//! Wraps the keyring crate to provide OS-native credential storage.

use thiserror::Error;

use crate::providers::google::GoogleCredentials;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Stored credential is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Provides access to the OS keychain for credential storage.
///
/// Credentials are stored using the service name as a namespace,
/// allowing one set of Google credentials per configured account name.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Default service name for kvitas credentials.
    pub const DEFAULT_SERVICE: &'static str = "lt.kvitas";

    /// Creates a new KeychainAccess with the default service name.
    pub fn new() -> Self {
        Self {
            service_name: Self::DEFAULT_SERVICE.to_string(),
        }
    }

    /// Creates a new KeychainAccess with a custom service name.
    ///
    /// Useful for testing to avoid interfering with real credentials.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Stores a credential in the keychain.
    ///
    /// If a credential with the same key already exists, it is overwritten.
    pub async fn store(&self, key: &str, value: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            entry.set_password(&value)?;
            Ok(())
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Retrieves a credential from the keychain.
    ///
    /// Returns `None` if no credential exists for the key.
    pub async fn retrieve(&self, key: &str) -> Result<Option<String>> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            match entry.get_password() {
                Ok(password) => Ok(Some(password)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Stores Google OAuth credentials for `account`.
    pub async fn store_google_credentials(
        &self,
        account: &str,
        credentials: &GoogleCredentials,
    ) -> Result<()> {
        let json = serde_json::to_string(credentials)?;
        self.store(&Self::google_credentials_key(account), &json)
            .await
    }

    /// Loads the Google OAuth credentials stored for `account`.
    ///
    /// # Errors
    ///
    /// Returns [`KeychainError::NotFound`] if nothing is stored for the account.
    pub async fn google_credentials(&self, account: &str) -> Result<GoogleCredentials> {
        let key = Self::google_credentials_key(account);
        let json = self
            .retrieve(&key)
            .await?
            .ok_or(KeychainError::NotFound(key))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Returns the service name used for this keychain access.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Generates a keychain key for an account's Google credentials.
    pub fn google_credentials_key(account: &str) -> String {
        format!("google.credentials.{}", account)
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}
