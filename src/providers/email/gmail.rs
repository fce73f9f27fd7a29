//! Gmail API mailbox.
//!
//! Uses the Gmail REST API over an authenticated [`GoogleSession`]. Messages are
//! fetched in `raw` format, so the body arrives as one base64url string and
//! MIME decoding happens locally.

use std::sync::Arc;

use async_trait::async_trait;
use base64::prelude::*;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;
use serde::{Deserialize, Serialize};
use url::Url;

use super::traits::{MailboxProvider, OutgoingEmail};
use crate::domain::{MessageRef, RawMessage};
use crate::providers::google::GoogleSession;
use crate::providers::{ProviderError, Result};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/";

// ============================================================================
// Gmail API Response Types
// ============================================================================

/// Response from the messages.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<GmailMessageRef>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageRef {
    id: String,
}

/// A message fetched with `format=raw`.
#[derive(Debug, Deserialize)]
struct GmailRawMessage {
    id: String,
    #[serde(default)]
    raw: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

// ============================================================================
// Gmail Mailbox
// ============================================================================

/// Gmail mailbox for one user.
pub struct GmailMailbox {
    session: Arc<GoogleSession>,
    base_url: Url,
}

impl GmailMailbox {
    /// Creates a mailbox for `user_id` (`"me"` is the authenticated user).
    pub fn new(session: Arc<GoogleSession>, user_id: &str) -> Result<Self> {
        let base_url = Url::parse(GMAIL_API_BASE)
            .and_then(|base| base.join(&format!("{}/", user_id)))
            .map_err(|e| ProviderError::InvalidRequest(format!("bad user id: {}", e)))?;
        Ok(Self { session, base_url })
    }

    /// Builds an endpoint URL below the user's base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Builds an RFC 5322 message for sending and encodes it for the Gmail API.
fn build_raw_message(email: &OutgoingEmail) -> Result<String> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e| ProviderError::InvalidRequest(format!("invalid sender {}: {}", email.from, e)))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| ProviderError::InvalidRequest(format!("invalid recipient {}: {}", email.to, e)))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body_text.clone())
        .map_err(|e| ProviderError::InvalidRequest(format!("build message: {}", e)))?;

    Ok(BASE64_URL_SAFE_NO_PAD.encode(message.formatted()))
}

#[async_trait]
impl MailboxProvider for GmailMailbox {
    async fn list_recent(&self, limit: u32) -> Result<Vec<MessageRef>> {
        let mut url = self.endpoint(&["messages"])?;
        url.query_pairs_mut()
            .append_pair("maxResults", &limit.to_string());

        let response: MessageListResponse = self.session.get(url).await?;
        tracing::debug!(count = response.messages.len(), "Listed recent messages");

        Ok(response
            .messages
            .into_iter()
            .map(|m| MessageRef::new(m.id))
            .collect())
    }

    async fn fetch_raw(&self, message: &MessageRef) -> Result<RawMessage> {
        let mut url = self.endpoint(&["messages", &message.id.0])?;
        url.query_pairs_mut().append_pair("format", "raw");

        let response: GmailRawMessage = self.session.get(url).await?;
        Ok(RawMessage {
            id: response.id.into(),
            encoded_body: response.raw,
        })
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let raw = build_raw_message(email)?;
        let url = self.endpoint(&["messages", "send"])?;

        let response: SendResponse = self.session.post(url, &SendRequest { raw }).await?;

        tracing::info!(message_id = %response.id, "Email sent via Gmail API");
        Ok(response.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::google::GoogleCredentials;
    use mailparse::MailHeaderMap;

    fn mailbox() -> GmailMailbox {
        let session = GoogleSession::new(GoogleCredentials {
            refresh_token: "r".to_string(),
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
        });
        GmailMailbox::new(Arc::new(session), "me").unwrap()
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "me@example.com".to_string(),
            to: "you@example.com".to_string(),
            subject: "FINANSAI: Likęs balansas savaitei".to_string(),
            body_text: "Labas,\nSavaitės likutis: 12.50".to_string(),
        }
    }

    #[test]
    fn endpoint_urls() {
        let mailbox = mailbox();
        assert_eq!(
            mailbox.endpoint(&["messages"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages"
        );
        assert_eq!(
            mailbox.endpoint(&["messages", "abc123"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/abc123"
        );
    }

    #[test]
    fn endpoint_escapes_segments() {
        let mailbox = mailbox();
        let url = mailbox.endpoint(&["messages", "a/b"]).unwrap();
        assert!(url.as_str().ends_with("/messages/a%2Fb"));
    }

    #[test]
    fn raw_message_is_url_safe_rfc5322() {
        let raw = build_raw_message(&email()).unwrap();
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));

        let bytes = BASE64_URL_SAFE_NO_PAD.decode(raw).unwrap();
        let parsed = mailparse::parse_mail(&bytes).unwrap();
        assert_eq!(
            parsed.headers.get_first_value("To"),
            Some("you@example.com".to_string())
        );
        let body = parsed.get_body().unwrap();
        assert!(body.starts_with("Labas,"));
        assert!(body.contains("Savaitės likutis: 12.50"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let mut email = email();
        email.to = "not an address".to_string();
        assert!(matches!(
            build_raw_message(&email),
            Err(ProviderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn list_response_without_messages() {
        let response: MessageListResponse = serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        assert!(response.messages.is_empty());
    }
}
