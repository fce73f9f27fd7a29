//! Raw message decoding.
//!
//! Turns a base64url encoded RFC 5322 message into a [`DecodedDocument`],
//! rejecting anything that is not from the merchant.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use mailparse::{MailHeaderMap, ParsedMail};

use super::SkipReason;
use crate::domain::{BodyPart, DecodedDocument, MessageId, RawMessage};

/// Base64url that accepts bodies with or without trailing padding.
const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes `raw` and keeps it only if it was sent by `merchant`.
pub fn decode(raw: &RawMessage, merchant: &str) -> Result<DecodedDocument, SkipReason> {
    let bytes = BASE64_URL_LENIENT
        .decode(raw.encoded_body.trim())
        .map_err(|e| SkipReason::InvalidBase64(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| SkipReason::InvalidUtf8)?;

    let mail =
        mailparse::parse_mail(text.as_bytes()).map_err(|e| SkipReason::Mime(e.to_string()))?;

    let from = mail
        .headers
        .get_first_value("From")
        .ok_or(SkipReason::MissingSender)?;
    let sender = angle_address(&from).ok_or(SkipReason::MissingSender)?;

    if sender != merchant {
        return Err(SkipReason::SenderMismatch(sender.to_string()));
    }

    let mut parts = Vec::new();
    collect_leaf_parts(&mail, &raw.id, &mut parts);

    Ok(DecodedDocument {
        id: raw.id.clone(),
        sender_address: sender.to_string(),
        parts,
    })
}

/// Extracts the address between the first `<` and the last `>` after it.
fn angle_address(value: &str) -> Option<&str> {
    let start = value.find('<')?;
    let end = value.rfind('>')?;
    if end <= start {
        return None;
    }
    Some(&value[start + 1..end])
}

fn collect_leaf_parts(mail: &ParsedMail, id: &MessageId, parts: &mut Vec<BodyPart>) {
    if !mail.subparts.is_empty() {
        for sub in &mail.subparts {
            collect_leaf_parts(sub, id, parts);
        }
        return;
    }

    let content_type = mail.ctype.mimetype.to_ascii_lowercase();
    match mail.get_body() {
        Ok(payload) => parts.push(BodyPart {
            content_type,
            payload,
        }),
        Err(e) => {
            tracing::debug!(
                message_id = %id,
                content_type = %content_type,
                error = %e,
                "Dropping undecodable part"
            );
        }
    }
}
