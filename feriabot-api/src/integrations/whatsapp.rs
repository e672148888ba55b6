use async_trait::async_trait;
use feriabot_core::errors::TransportError;
use feriabot_core::Messenger;
use serde::Deserialize;
use serde_json::json;

use crate::config::WhatsAppConfig;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// WhatsApp Cloud API client: outbound text replies and media downloads.
///
/// Send failures are reported, never retried here; retry policy belongs to
/// the platform's own delivery semantics.
pub struct WhatsAppClient {
    client: reqwest::Client,
    access_token: String,
    phone_number_id: String,
    api_base: String,
}

#[derive(Deserialize)]
struct MediaLookup {
    url: String,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            api_base: GRAPH_API_BASE.to_string(),
        }
    }
}

fn http_error(error: reqwest::Error) -> TransportError {
    TransportError::Http(error.to_string())
}

#[async_trait]
impl Messenger for WhatsAppClient {
    async fn send(&self, to: &str, body: &str) -> Result<(), TransportError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": body },
            }))
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to, "reply delivered");
        Ok(())
    }

    /// Resolves a media id to its download URL, then fetches the bytes.
    /// Both calls need bearer auth; media URLs are short-lived.
    async fn fetch_media(&self, media_ref: &str) -> Result<Vec<u8>, TransportError> {
        let lookup_url = format!("{}/{}", self.api_base, media_ref);

        let response = self
            .client
            .get(&lookup_url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let lookup: MediaLookup = response.json().await.map_err(http_error)?;

        let response = self
            .client
            .get(&lookup.url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(http_error)?;
        tracing::debug!(media_ref, size = bytes.len(), "media downloaded");

        Ok(bytes.to_vec())
    }
}
