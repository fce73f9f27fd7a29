//! Mailbox message types.
//!
//! A message enters the pipeline as a [`RawMessage`] holding the transport
//! encoded RFC 5322 text, and leaves the decoder as a [`DecodedDocument`]
//! with its leaf MIME parts flattened in document order.

use serde::{Deserialize, Serialize};

use super::MessageId;

/// Reference to a message returned by a mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Provider-assigned message ID.
    pub id: MessageId,
}

impl MessageRef {
    /// Creates a reference for the given message ID.
    pub fn new(id: impl Into<MessageId>) -> Self {
        Self { id: id.into() }
    }
}

/// A message as fetched from the mailbox, before any decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider-assigned message ID.
    pub id: MessageId,
    /// Base64url encoded RFC 5322 message.
    pub encoded_body: String,
}

/// A single leaf part of a decoded MIME message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPart {
    /// Lowercase MIME type, e.g. `text/html`.
    pub content_type: String,
    /// Part body with transfer encoding and charset already applied.
    pub payload: String,
}

/// A decoded message from an accepted sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedDocument {
    /// ID of the message this document was decoded from.
    pub id: MessageId,
    /// Bare sender address taken from the `From` header.
    pub sender_address: String,
    /// Leaf body parts in document order.
    pub parts: Vec<BodyPart>,
}

impl DecodedDocument {
    /// Returns the first part with the given MIME type.
    pub fn first_part(&self, content_type: &str) -> Option<&BodyPart> {
        self.parts
            .iter()
            .find(|part| part.content_type.eq_ignore_ascii_case(content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(parts: Vec<BodyPart>) -> DecodedDocument {
        DecodedDocument {
            id: MessageId::from("msg-1"),
            sender_address: "shop@example.com".to_string(),
            parts,
        }
    }

    #[test]
    fn first_part_picks_earliest_match() {
        let doc = document(vec![
            BodyPart {
                content_type: "text/plain".to_string(),
                payload: "plain".to_string(),
            },
            BodyPart {
                content_type: "text/html".to_string(),
                payload: "<p>first</p>".to_string(),
            },
            BodyPart {
                content_type: "text/html".to_string(),
                payload: "<p>second</p>".to_string(),
            },
        ]);

        let html = doc.first_part("text/html").unwrap();
        assert_eq!(html.payload, "<p>first</p>");
    }

    #[test]
    fn first_part_ignores_case() {
        let doc = document(vec![BodyPart {
            content_type: "text/html".to_string(),
            payload: String::new(),
        }]);
        assert!(doc.first_part("TEXT/HTML").is_some());
    }

    #[test]
    fn first_part_missing() {
        let doc = document(vec![]);
        assert!(doc.first_part("text/html").is_none());
    }

    #[test]
    fn message_ref_new() {
        let r = MessageRef::new("abc");
        assert_eq!(r.id, MessageId::from("abc"));
    }
}
