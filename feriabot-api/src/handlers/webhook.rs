use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use feriabot_core::MessageRouter;
use feriabot_types::{InboundMessage, MessageKind};
use serde::Deserialize;

use crate::database::Database;

pub struct AppState {
    pub router: Arc<MessageRouter>,
    pub verify_token: String,
}

pub async fn health(db: web::Data<Arc<Database>>) -> HttpResponse {
    match db.connection.lock() {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

/// Meta's webhook verification handshake.
#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

fn is_valid_verification(mode: &str, token: &str, expected: &str) -> bool {
    mode == "subscribe" && token == expected
}

pub async fn verify(state: web::Data<AppState>, query: web::Query<VerifyQuery>) -> HttpResponse {
    if is_valid_verification(&query.mode, &query.verify_token, &state.verify_token) {
        tracing::info!("webhook verified");
        HttpResponse::Ok()
            .content_type("text/plain")
            .body(query.challenge.clone())
    } else {
        tracing::warn!(mode = %query.mode, "webhook verification failed");
        HttpResponse::Forbidden().finish()
    }
}

// WhatsApp Business webhook payload, pared down to the fields we read.

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    pub field: Option<String>,
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub id: Option<String>,
    pub from: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<TextContent>,
    pub audio: Option<MediaContent>,
    pub image: Option<MediaContent>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaContent {
    pub id: Option<String>,
}

/// Inbound webhook. Each message is handled on its own task so a slow
/// classifier call for one sender never blocks the others; the transport
/// gets its 200 as soon as the payload parses.
pub async fn receive(
    state: web::Data<AppState>,
    payload: web::Json<WebhookPayload>,
) -> HttpResponse {
    let messages = parse_messages(&payload);

    for message in messages {
        tracing::info!(
            message_id = %message.message_id,
            sender = %message.sender,
            kind = ?message.kind,
            "inbound message"
        );

        let router = state.router.clone();
        tokio::spawn(async move {
            router.handle(&message).await;
        });
    }

    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Flattens the entry/changes/messages nesting into inbound messages.
/// Events that are not vendor messages (statuses, unsupported types,
/// incomplete entries) are skipped with a log line.
pub fn parse_messages(payload: &WebhookPayload) -> Vec<InboundMessage> {
    if payload.object.as_deref() != Some("whatsapp_business_account") {
        tracing::debug!(object = ?payload.object, "ignoring non-whatsapp webhook object");
        return Vec::new();
    }

    let mut messages = Vec::new();

    for entry in &payload.entry {
        for change in &entry.changes {
            if change.field.as_deref() != Some("messages") {
                continue;
            }
            let Some(value) = &change.value else { continue };

            for message in &value.messages {
                let (Some(id), Some(from)) = (message.id.as_deref(), message.from.as_deref())
                else {
                    tracing::warn!("webhook message missing id or sender, skipping");
                    continue;
                };

                let timestamp = message
                    .timestamp
                    .as_deref()
                    .and_then(|t| t.parse::<i64>().ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or_else(Utc::now);

                let inbound = match message.kind.as_deref() {
                    Some("text") => {
                        let Some(body) = message.text.as_ref().and_then(|t| t.body.as_deref())
                        else {
                            tracing::warn!(message_id = id, "text message without body, skipping");
                            continue;
                        };
                        InboundMessage {
                            message_id: id.to_string(),
                            sender: from.to_string(),
                            kind: MessageKind::Text,
                            text: Some(body.to_string()),
                            media_ref: None,
                            timestamp,
                        }
                    }
                    Some("audio") | Some("image") => {
                        let (kind, media) = if message.kind.as_deref() == Some("audio") {
                            (MessageKind::Audio, &message.audio)
                        } else {
                            (MessageKind::Image, &message.image)
                        };
                        let Some(media_id) = media.as_ref().and_then(|m| m.id.as_deref()) else {
                            tracing::warn!(message_id = id, "media message without media id, skipping");
                            continue;
                        };
                        InboundMessage {
                            message_id: id.to_string(),
                            sender: from.to_string(),
                            kind,
                            text: None,
                            media_ref: Some(media_id.to_string()),
                            timestamp,
                        }
                    }
                    other => {
                        tracing::debug!(message_id = id, kind = ?other, "unsupported message type, skipping");
                        continue;
                    }
                };

                messages.push(inbound);
            }
        }
    }

    messages
}
