use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use feriabot_core::errors::ClassifyError;
use feriabot_core::TransactionClassifier;
use feriabot_types::{ProcessedTransaction, TransactionType};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::integrations::prompts;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// OpenAI-backed implementation of the classification oracle: chat
/// completions for text, vision for ticket photos, and the transcription
/// endpoint for voice notes.
///
/// Model output that cannot be interpreted is treated as "no financial
/// intent" (Ok(None)); only infrastructure problems become errors.
pub struct OpenAiClassifier {
    client: reqwest::Client,
    api_key: String,
    chat_model: String,
    transcription_model: String,
    json_block: Regex,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// The JSON shape the prompts demand from the model.
#[derive(Deserialize)]
struct WireTransaction {
    transaction_type: String,
    amount: Decimal,
    description: String,
    confidence: f32,
}

impl OpenAiClassifier {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            chat_model: config
                .chat_model
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            transcription_model: config
                .transcription_model
                .clone()
                .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_MODEL.to_string()),
            json_block: Regex::new(r"(?s)\{.*\}").expect("json block pattern is valid"),
        }
    }

    async fn chat(&self, body: serde_json::Value) -> Result<Option<String>, ClassifyError> {
        let response = self
            .client
            .post(format!("{OPENAI_API_BASE}/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }

    /// Pulls the JSON object out of the model's reply. The model is told to
    /// answer raw JSON or the literal "null", but occasionally wraps it in
    /// prose or markdown; the regex recovers from that.
    fn parse_transaction(&self, content: &str) -> Option<ProcessedTransaction> {
        let content = content.trim();
        if content.is_empty() || content.eq_ignore_ascii_case("null") {
            return None;
        }

        let json_str = self
            .json_block
            .find(content)
            .map(|m| m.as_str())
            .unwrap_or(content);

        let wire: WireTransaction = match serde_json::from_str(json_str) {
            Ok(wire) => wire,
            Err(error) => {
                tracing::warn!(%error, raw = %content, "could not parse classifier reply");
                return None;
            }
        };

        let Some(kind) = TransactionType::parse(&wire.transaction_type) else {
            tracing::warn!(kind = %wire.transaction_type, "classifier returned unknown kind");
            return None;
        };

        Some(ProcessedTransaction {
            kind,
            amount: wire.amount,
            description: wire.description,
            confidence: wire.confidence.clamp(0.0, 1.0),
        })
    }
}

#[async_trait]
impl TransactionClassifier for OpenAiClassifier {
    async fn classify_text(
        &self,
        text: &str,
    ) -> Result<Option<ProcessedTransaction>, ClassifyError> {
        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": prompts::TEXT_SYSTEM_PROMPT },
                { "role": "user", "content": format!("Procesa este mensaje: '{text}'") },
            ],
            "temperature": 0.1,
            "max_tokens": 200,
        });

        let Some(content) = self.chat(body).await? else {
            return Ok(None);
        };

        tracing::debug!(reply = %content, "text classification reply");
        Ok(self.parse_transaction(&content))
    }

    async fn classify_image(
        &self,
        image: &[u8],
    ) -> Result<Option<ProcessedTransaction>, ClassifyError> {
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(image));

        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": prompts::TICKET_SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "Analiza este ticket de compra:" },
                        { "type": "image_url", "image_url": { "url": data_url } },
                    ],
                },
            ],
            "temperature": 0.1,
            "max_tokens": 300,
        });

        let Some(content) = self.chat(body).await? else {
            return Ok(None);
        };

        tracing::debug!(reply = %content, "ticket classification reply");
        Ok(self.parse_transaction(&content))
    }

    async fn transcribe_audio(&self, audio: &[u8]) -> Result<Option<String>, ClassifyError> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec()).file_name("voice-note.ogg");
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .text("language", "es")
            .part("file", part);

        let response = self
            .client
            .post(format!("{OPENAI_API_BASE}/audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;

        let transcript = parsed.text.trim().to_string();
        if transcript.is_empty() {
            return Ok(None);
        }

        tracing::info!(transcript = %transcript, "voice note transcribed");
        Ok(Some(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    fn classifier() -> OpenAiClassifier {
        OpenAiClassifier::new(&OpenAiConfig {
            api_key: "test-key".to_string(),
            chat_model: None,
            transcription_model: None,
        })
    }

    #[test]
    fn test_parse_plain_json_reply() {
        let reply = r#"{"transaction_type": "venta", "amount": 45.0, "description": "3 refrescos", "confidence": 0.95}"#;
        let parsed = classifier().parse_transaction(reply).unwrap();
        assert_eq!(parsed.kind, TransactionType::Sale);
        assert_eq!(parsed.amount, "45".parse::<Decimal>().unwrap());
        assert_eq!(parsed.description, "3 refrescos");
    }

    #[test]
    fn test_parse_reply_wrapped_in_markdown() {
        let reply = "```json\n{\"transaction_type\": \"gasto\", \"amount\": 80, \"description\": \"luz\", \"confidence\": 0.9}\n```";
        let parsed = classifier().parse_transaction(reply).unwrap();
        assert_eq!(parsed.kind, TransactionType::Expense);
    }

    #[test]
    fn test_parse_negative_adjustment() {
        let reply = r#"{"transaction_type": "ajuste", "amount": -150, "description": "retirado de caja", "confidence": 0.9}"#;
        let parsed = classifier().parse_transaction(reply).unwrap();
        assert_eq!(parsed.kind, TransactionType::CashAdjustment);
        assert!(parsed.amount < Decimal::ZERO);
    }

    #[test]
    fn test_null_and_noise_mean_no_intent() {
        let c = classifier();
        assert!(c.parse_transaction("null").is_none());
        assert!(c.parse_transaction("NULL").is_none());
        assert!(c.parse_transaction("").is_none());
        assert!(c.parse_transaction("no veo nada financiero aquí").is_none());
        assert!(c.parse_transaction(r#"{"transaction_type": "propina", "amount": 1, "description": "x", "confidence": 0.5}"#).is_none());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let reply = r#"{"transaction_type": "venta", "amount": 10, "description": "x", "confidence": 1.7}"#;
        let parsed = classifier().parse_transaction(reply).unwrap();
        assert_eq!(parsed.confidence, 1.0);
    }
}
