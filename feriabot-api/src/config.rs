use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub whatsapp: WhatsAppConfig,
    pub openai: OpenAiConfig,
    pub alerts: Option<AlertsConfig>,
    pub pending: Option<PendingConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WhatsAppConfig {
    /// Bearer token for the WhatsApp Cloud API.
    pub access_token: String,
    /// The business phone-number id messages are sent from.
    pub phone_number_id: String,
    /// Token echoed back during the webhook verification handshake.
    pub verify_token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub chat_model: Option<String>,
    pub transcription_model: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlertsConfig {
    pub low_balance_threshold: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            low_balance_threshold: 500.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PendingConfig {
    pub ttl_secs: i64,
    pub sweep_interval_secs: u64,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            sweep_interval_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load(path_override: Option<PathBuf>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path_override.unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = r#"
[server]
host = "0.0.0.0"
port = 8000

[whatsapp]
access_token = ""
phone_number_id = ""
verify_token = ""

[openai]
api_key = ""
# chat_model = "gpt-4o"
# transcription_model = "whisper-1"

[alerts]
# Balance below this appends an alert line to replies
low_balance_threshold = 500.0

[pending]
# Correction window in seconds
ttl_secs = 120
sweep_interval_secs = 60
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: AppConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("feriabot").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
