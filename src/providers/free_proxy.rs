// Free-proxy aggregator adapter
//
// The proxy speaks an OpenAI-like chat endpoint but uses its own model names
// and answers with plain text rather than a choices array.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::types::{ChatMessage, ChatRequest};
use super::{check_status, ChatAdapter, ProviderError};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1337";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const PROVIDER: &str = "free_proxy";

/// Logical model id -> proxy model name
const MODEL_TABLE: &[(&str, &str)] = &[
    ("gpt-3.5-turbo", "gpt-3.5-turbo"),
    ("gpt-3.5-turbo-1106", "gpt-3.5-turbo"),
    ("gpt-4", "gpt-4"),
    ("gpt-4-1106-preview", "gpt-4-turbo"),
    ("gpt-4-turbo-preview", "gpt-4-turbo"),
    ("gemini-pro", "gemini-pro"),
    ("llama2-70b", "meta-llama/Llama-2-70b-chat-hf"),
    ("mixtral-8x7b", "mistralai/Mixtral-8x7B-Instruct-v0.1"),
    ("claude-v2", "claude-v2"),
];

/// Proxy name for a logical model id, if the table knows it
pub fn proxy_model_name(model: &str) -> Option<&'static str> {
    MODEL_TABLE
        .iter()
        .find(|(logical, _)| *logical == model)
        .map(|(_, proxied)| *proxied)
}

/// Every logical id the proxy accepts
pub fn supported_models() -> impl Iterator<Item = &'static str> {
    MODEL_TABLE.iter().map(|(logical, _)| *logical)
}

#[derive(Clone)]
pub struct FreeProxyAdapter {
    client: Client,
    base_url: String,
}

impl FreeProxyAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatAdapter for FreeProxyAdapter {
    async fn call(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let model = proxy_model_name(&request.model)
            .ok_or_else(|| ProviderError::UnknownModel(request.model.clone()))?;

        let body = ProxyRequest {
            model,
            messages: &request.messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        Ok(response.text().await?)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_model_table_lookup() {
        assert_eq!(proxy_model_name("gpt-4-1106-preview"), Some("gpt-4-turbo"));
        assert_eq!(proxy_model_name("gemini-pro"), Some("gemini-pro"));
        assert_eq!(proxy_model_name("no-such-model"), None);
        assert!(supported_models().any(|m| m == "mixtral-8x7b"));
    }

    #[tokio::test]
    async fn test_sends_mapped_model_and_returns_raw_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(json!({"model": "gpt-4-turbo"})))
            .with_status(200)
            .with_body("plain reply")
            .create_async()
            .await;

        let adapter = FreeProxyAdapter::new(server.url()).unwrap();
        let request = ChatRequest::new(
            "gpt-4-1106-preview",
            vec![ChatMessage::system("P"), ChatMessage::user("c")],
        );

        assert_eq!(adapter.call(&request).await.unwrap(), "plain reply");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_model_fails_before_network() {
        let adapter = FreeProxyAdapter::new("http://127.0.0.1:9").unwrap();
        let request = ChatRequest::new("mystery", vec![ChatMessage::user("c")]);
        match adapter.call(&request).await {
            Err(ProviderError::UnknownModel(model)) => assert_eq!(model, "mystery"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
