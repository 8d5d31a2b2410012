use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_concurrent_generations: usize,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_path: PathBuf,
    pub static_dir: PathBuf,
    pub model: ModelConfig,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .context("OPENAI_API_KEY is not set; check your .env file")?;

        Ok(Self::with_api_key(api_key))
    }

    /// Same defaults as `from_env`, without requiring a key. Used by tools
    /// that never reach the model.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: env::var("CAMPUS_CHATBOT_BIND")
                .unwrap_or_else(|_| "127.0.0.1:5001".to_string()),
            data_path: env::var("CAMPUS_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data.json")),
            static_dir: env::var("CAMPUS_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            model: ModelConfig {
                base_url: env::var("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: api_key.into(),
                chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                temperature: env::var("CHAT_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.7),
                max_tokens: env::var("CHAT_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(800),
                timeout: Duration::from_secs(
                    env::var("CHAT_TIMEOUT_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(60),
                ),
                max_concurrent_generations: env::var("MAX_CONCURRENT_GENERATIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|n: &usize| *n > 0)
                    .unwrap_or(4),
            },
        }
    }
}
