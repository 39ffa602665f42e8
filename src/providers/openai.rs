// OpenAI chat-completions adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{ChatMessage, ChatRequest};
use super::{check_status, ChatAdapter, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

const PROVIDER: &str = "openai";

/// Sends the full `[system, ...history, user]` list to `/v1/chat/completions`
#[derive(Clone)]
pub struct OpenAiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatAdapter for OpenAiAdapter {
    async fn call(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
        };

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "calling OpenAI"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER,
                reason: "no message content in first choice".to_string(),
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
