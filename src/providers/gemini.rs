// Gemini generateContent adapter
//
// Single-turn only: the request text is the system prompt and the newest user
// message joined by a blank line. Earlier history is not sent.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::ChatRequest;
use super::{check_status, ChatAdapter, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const PROVIDER: &str = "gemini";

/// `prompt + "\n\n" + content`
pub fn build_prompt(system_prompt: &str, content: &str) -> String {
    format!("{}\n\n{}", system_prompt, content)
}

#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiAdapter {
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

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ChatAdapter for GeminiAdapter {
    async fn call(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let content = request
            .latest_user_content()
            .ok_or_else(|| {
                ProviderError::InvalidRequest("conversation must end with a user message".into())
            })?;
        let prompt = build_prompt(request.system_prompt().unwrap_or_default(), content);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        let response = check_status(PROVIDER, response).await?;

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER,
                reason: "no text in first candidate".to_string(),
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::ChatMessage;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_build_prompt() {
        assert_eq!(build_prompt("P", "c"), "P\n\nc");
    }

    #[tokio::test]
    async fn test_sends_single_combined_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
            .match_body(Matcher::Json(json!({
                "contents": [{"parts": [{"text": "P\n\nc"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "from gemini"}], "role": "model"}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        // history entries are dropped
        let request = ChatRequest::new(
            "gemini-pro",
            vec![
                ChatMessage::system("P"),
                ChatMessage::user("earlier"),
                ChatMessage::assistant("reply"),
                ChatMessage::user("c"),
            ],
        );
        let adapter = GeminiAdapter::new("g-key", server.url()).unwrap();

        assert_eq!(adapter.call(&request).await.unwrap(), "from gemini");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_candidates_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let request = ChatRequest::new(
            "gemini-pro",
            vec![ChatMessage::system("P"), ChatMessage::user("c")],
        );
        let adapter = GeminiAdapter::new("g-key", server.url()).unwrap();
        assert!(matches!(
            adapter.call(&request).await,
            Err(ProviderError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_without_user_message_is_rejected() {
        let adapter = GeminiAdapter::new("g-key", "http://127.0.0.1:9").unwrap();
        let request = ChatRequest::new("gemini-pro", vec![ChatMessage::system("P")]);
        assert!(matches!(
            adapter.call(&request).await,
            Err(ProviderError::InvalidRequest(_))
        ));
    }
}
