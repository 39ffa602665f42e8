// Chat-completion providers
//
// Each interaction names a model; the dispatcher picks exactly one adapter
// (OpenAI, Gemini or the free proxy) for that model, feeds it the assembled
// conversation and turns any failure into a fixed reply.

use async_trait::async_trait;
use thiserror::Error;

pub mod types;

// Adapters
pub mod free_proxy;
pub mod gemini;
pub mod openai;

// Selection and conversation assembly
pub mod dispatcher;
pub mod factory;
pub mod history;
pub mod registry;

pub use dispatcher::{select_provider, Dispatcher, ERROR_SENTINEL};
pub use factory::create_dispatcher;
pub use registry::ModelRegistry;
pub use types::{Availability, ChatMessage, ChatRequest, ProviderCredentials, ProviderKind};

/// Everything that can go wrong inside an adapter call
///
/// Never crosses the dispatcher boundary; it exists so logs keep the cause.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} API request failed with status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {provider} response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("model '{0}' is not supported by the free proxy")]
    UnknownModel(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no adapter configured for {0}")]
    NotConfigured(&'static str),
}

/// A single chat-completion backend
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Send the conversation and return the reply text.
    async fn call(&self, request: &ChatRequest) -> Result<String, ProviderError>;

    /// Provider name for logs (e.g. "openai")
    fn name(&self) -> &str;
}

/// Turn a non-2xx response into [`ProviderError::Status`].
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}
