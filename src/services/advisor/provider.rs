//! HTTP client for the external suggestion service.

use anyhow::Context;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Chat-completions endpoint used when none is configured.
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

pub(crate) const ADVISOR_MODEL: &str = "gpt-4o-mini";
pub(crate) const ADVISOR_TEMPERATURE: f32 = 0.2;

/// Turns a learning-report prompt into raw suggestion JSON.
///
/// The call is untrusted: implementations report transport and service
/// failures as `Err(String)` and never panic.
pub trait SuggestionProvider: Send + Sync {
    fn suggest(&self, prompt: &str) -> Result<String, String>;
}

pub struct HttpSuggestionProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpSuggestionProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

impl SuggestionProvider for HttpSuggestionProvider {
    fn suggest(&self, prompt: &str) -> Result<String, String> {
        self.try_suggest(prompt).map_err(|e| e.to_string())
    }
}

impl HttpSuggestionProvider {
    fn try_suggest(&self, prompt: &str) -> Result<String, anyhow::Error> {
        let payload = ChatRequest {
            model: ADVISOR_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: ADVISOR_TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let res = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            anyhow::bail!("API error {status}: {text}");
        }

        let chat_res: ChatResponse = res.json()?;

        let content = chat_res
            .choices
            .into_iter()
            .next()
            .context("No choices in service response")?
            .message
            .content;
        Ok(content)
    }
}
