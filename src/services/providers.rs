// AI Provider Service
// Implements the OpenRouter chat completions call

use crate::services::config_store::RunConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

const MAX_COMPLETION_TOKENS: i32 = 4096;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("authentication rejected ({status}): {message}. Check that your OpenRouter API key is valid")]
    AuthError { status: u16, message: String },
    #[error(
        "model endpoint not found (404): {message}. Free-tier models require prompt training \
         to be allowed in your OpenRouter privacy settings (https://openrouter.ai/settings/privacy)"
    )]
    NotFoundError { message: String },
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
}

impl ProviderError {
    /// Fatal errors abort the run; everything else leaves the current
    /// batch unresolved and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthError { .. } | ProviderError::NotFoundError { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// HTTP client for the OpenRouter chat completions endpoint.
///
/// All connection parameters come from the injected [`RunConfig`];
/// nothing here reads the environment.
pub struct ModerationClient {
    client: Client,
    chat_url: String,
    api_key: String,
    model: String,
    app_referer: String,
    app_title: String,
}

impl ModerationClient {
    pub fn new(config: &RunConfig) -> Self {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            chat_url: format!("{}/chat/completions", config.api_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            app_referer: config.app_referer.clone(),
            app_title: config.app_title.clone(),
        }
    }

    /// Send one moderation prompt and return the raw assistant text.
    pub async fn classify(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 0.0,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.chat_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.app_referer)
            .header("X-Title", &self.app_title)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[PROVIDER] API returned {} after {}ms",
                status.as_u16(),
                latency_ms
            );
            return Err(classify_status(status.as_u16(), body));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::MissingContent)?;

        info!(
            "[PROVIDER] Completion received in {}ms ({} chars)",
            latency_ms,
            content.len()
        );
        Ok(content)
    }
}

fn classify_status(status: u16, message: String) -> ProviderError {
    match status {
        401 => ProviderError::AuthError { status, message },
        404 => ProviderError::NotFoundError { message },
        _ => ProviderError::ApiError { status, message },
    }
}
