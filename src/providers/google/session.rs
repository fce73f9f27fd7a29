//! OAuth 2.0 session for Google REST APIs.
//!
//! The session exchanges a long-lived refresh token for short-lived access
//! tokens and refreshes them transparently. It also owns the HTTP helpers
//! that attach the bearer token and map HTTP failures to [`ProviderError`].

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::providers::{ProviderError, Result};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth client credentials plus the user's refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleCredentials {
    /// OAuth refresh token.
    pub refresh_token: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl GoogleCredentials {
    /// Parses credentials from their JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProviderError::Authentication(format!("invalid credentials: {}", e)))
    }

    /// Reads credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Authentication(format!("read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// An authenticated Google API session.
///
/// # Example
///
/// ```ignore
/// let session = GoogleSession::authenticate(credentials).await?;
/// let session = Arc::new(session);
/// let mailbox = GmailMailbox::new(Arc::clone(&session), "me");
/// let ledger = SheetsLedger::new(session, &settings.ledger);
/// ```
pub struct GoogleSession {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// OAuth credentials.
    credentials: GoogleCredentials,
    /// Token endpoint.
    token_url: String,
    /// Current access token, refreshed as needed.
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSession {
    /// Creates a session that has not fetched an access token yet.
    pub fn new(credentials: GoogleCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Creates a session and fetches the first access token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authentication`] if the refresh token is rejected.
    pub async fn authenticate(credentials: GoogleCredentials) -> Result<Self> {
        let session = Self::new(credentials);
        session.access_token().await?;
        tracing::info!("Google session authenticated");
        Ok(session)
    }

    /// Returns the underlying HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Returns a valid access token, refreshing it if needed.
    pub async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(current.value.clone());
        }

        let refreshed = self.refresh_access_token().await?;
        let value = refreshed.value.clone();
        *token = Some(refreshed);
        Ok(value)
    }

    /// Drops the cached access token so the next call refreshes it.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    /// Refreshes the OAuth access token using the refresh token.
    async fn refresh_access_token(&self) -> Result<AccessToken> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse token response: {}", e)))?;

        tracing::debug!(expires_in = token_response.expires_in, "Access token refreshed");
        Ok(AccessToken {
            value: token_response.access_token,
            expires_at: Instant::now() + Duration::from_secs(token_response.expires_in),
        })
    }

    /// Builds authorization headers for API requests.
    async fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.access_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Makes an authenticated GET request.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let headers = self.auth_headers().await?;
        let response = self.client.get(url).headers(headers).send().await?;
        self.handle_response(response).await
    }

    /// Makes an authenticated POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let headers = self.auth_headers().await?;
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Makes an authenticated PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let headers = self.auth_headers().await?;
        let response = self
            .client
            .put(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate().await;
        }
        error_for_status(status, body, retry_after_secs)
    }
}

/// Maps a non-success HTTP status to a provider error.
fn error_for_status(status: StatusCode, body: String, retry_after_secs: Option<u64>) -> ProviderError {
    match status.as_u16() {
        400 => ProviderError::InvalidRequest(body),
        401 | 403 => ProviderError::Authentication(format!("unauthorized: {}", body)),
        404 => ProviderError::NotFound(body),
        429 => ProviderError::RateLimited { retry_after_secs },
        code if status.is_server_error() => ProviderError::Unavailable { status: code, body },
        _ => ProviderError::Internal(format!("API error ({}): {}", status, body)),
    }
}
