use crate::config::Settings;
use crate::error::{GenerationError, Upstream};
use crate::llm::{CompletionClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat-completions client for Groq's OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl GroqClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings
            .groq_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("GROQ_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = std::env::var("GROQ_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|t| (0.0..=2.0).contains(t))
            .unwrap_or(DEFAULT_TEMPERATURE);

        let timeout_secs = std::env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url,
            model,
            max_tokens,
            temperature,
        })
    }

    fn request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn create_completion(
        &self,
        req: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<ChatCompletionResponse, GenerationError> {
        let upstream =
            |stage, detail: String| GenerationError::upstream(Upstream::Completion, stage, detail);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|_| upstream("http", "API key is not a valid header value".to_string()))?,
        );

        let url = format!(
            "{}/openai/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .map_err(|e| upstream("http", format!("Groq request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| upstream("http", format!("failed to read Groq response body: {e}")))?;
        if !status.is_success() {
            return Err(upstream("http", format!("status={status} body={text}")));
        }

        serde_json::from_str::<ChatCompletionResponse>(&text)
            .map_err(|e| upstream("decode", format!("failed to decode Groq response: {e}")))
    }

    fn response_text(res: ChatCompletionResponse) -> Option<String> {
        res.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

#[async_trait::async_trait]
impl CompletionClient for GroqClient {
    fn provider(&self) -> Provider {
        Provider::Groq
    }

    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, GenerationError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GenerationError::missing_credential());
        }

        let req = self.request(prompt);
        tracing::debug!(
            model = %req.model,
            max_tokens = req.max_tokens,
            temperature = req.temperature,
            prompt_chars = prompt.len(),
            "sending completion request"
        );

        let res = self.create_completion(&req, api_key).await?;
        if let Some(reason) = res.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                tracing::warn!(max_tokens = self.max_tokens, "completion stopped at max_tokens");
            }
        }

        Self::response_text(res).ok_or_else(|| {
            GenerationError::upstream(Upstream::Completion, "decode", "response has no choices")
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
