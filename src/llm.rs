use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can turn a system prompt and a question into reply text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ChatReq<'a> {
            model: &'a str,
            messages: [Message<'a>; 2],
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ReplyMessage,
        }

        #[derive(Deserialize)]
        struct ReplyMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&ChatReq {
                model: &self.model,
                messages: [
                    Message {
                        role: "system",
                        content: request.system,
                    },
                    Message {
                        role: "user",
                        content: request.user,
                    },
                ],
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            })
            .send()
            .await
            .context("failed to call chat completions endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "chat completions returned {status}: {}",
                normalize_err_body(&body)
            );
        }

        let response = response
            .json::<ChatResp>()
            .await
            .context("failed to decode chat completions response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("chat completions returned no message content"))?;

        Ok(content.trim().to_string())
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let error = json.get("error");
        if let Some(message) = error
            .and_then(|err| err.get("message"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
        if let Some(err) = error.and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }

    trimmed.to_string()
}
