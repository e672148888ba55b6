use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the transport delivered for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
    Image,
}

/// One inbound WhatsApp message, already flattened out of the webhook
/// payload. `text` is set for text messages, `media_ref` for audio/image
/// (the provider-side media id, resolved to bytes by the messenger).
///
/// Delivery is at-least-once; duplicate `message_id`s are possible and
/// processed as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub sender: String,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub media_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn text(message_id: &str, sender: &str, body: &str) -> Self {
        Self {
            message_id: message_id.to_string(),
            sender: sender.to_string(),
            kind: MessageKind::Text,
            text: Some(body.to_string()),
            media_ref: None,
            timestamp: Utc::now(),
        }
    }

    pub fn media(message_id: &str, sender: &str, kind: MessageKind, media_ref: &str) -> Self {
        Self {
            message_id: message_id.to_string(),
            sender: sender.to_string(),
            kind,
            text: None,
            media_ref: Some(media_ref.to_string()),
            timestamp: Utc::now(),
        }
    }
}
