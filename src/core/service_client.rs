// src/core/service_client.rs
//! HTTP client for the generative content service

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::app_log;
use crate::core::config_manager::AiConfig;
use crate::types::response::{GenerateContentRequest, GenerateContentResponse, ServiceErrorBody};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Something that turns a prompt plus a response schema into JSON text
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("No API key configured: set GEMINI_API_KEY or API_KEY")?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ServiceErrorBody>(body) {
            Ok(parsed) => format!(
                "{} {}",
                parsed.error.status.unwrap_or_else(|| status.to_string()),
                parsed.error.message
            ),
            Err(_) if body.trim().is_empty() => status.to_string(),
            Err(_) => format!("{} {}", status, body.trim()),
        }
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let url = self.endpoint();
        let payload = GenerateContentRequest::json(prompt, schema);

        app_log!(info, "Calling generative service: {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("HTTP request to generative service failed")?;

        let status = response.status();
        app_log!(trace, "Response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(error, "Generative service error response: {}", error_text);
            anyhow::bail!(
                "Generative service returned {}",
                Self::describe_error(status, &error_text)
            );
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse generative service response")?;

        if let Some(reason) = body.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            app_log!(debug, "Finish reason: {}", reason);
        }

        Ok(body.text().unwrap_or_default())
    }
}
