// Provider dispatcher
//
// Selection is a pure function of (registry, available credentials, model);
// invocation is separate. Adapter failures never leave this module: they are
// logged with their typed cause and replaced by ERROR_SENTINEL.

use std::sync::Arc;

use crate::conversation::Interaction;
use crate::store::{MessageStore, StoreError};

use super::history;
use super::registry::ModelRegistry;
use super::types::{Availability, ChatMessage, ChatRequest, ProviderKind};
use super::{ChatAdapter, ProviderError};

/// Reply text used in place of any provider failure
pub const ERROR_SENTINEL: &str = "Sorry, an error has occurred.";

/// First match wins: OpenAI, then Gemini, then the free proxy.
pub fn select_provider(
    registry: &ModelRegistry,
    available: Availability,
    model: &str,
) -> ProviderKind {
    if available.openai && registry.is_openai_compatible(model) {
        ProviderKind::OpenAi
    } else if available.gemini && registry.is_gemini(model) {
        ProviderKind::Gemini
    } else {
        ProviderKind::FreeProxy
    }
}

/// Routes assembled conversations to exactly one adapter
///
/// The OpenAI and Gemini adapters exist only when their credential was
/// configured; the free proxy is always present.
#[derive(Clone)]
pub struct Dispatcher {
    registry: ModelRegistry,
    openai: Option<Arc<dyn ChatAdapter>>,
    gemini: Option<Arc<dyn ChatAdapter>>,
    free_proxy: Arc<dyn ChatAdapter>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("availability", &self.availability())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(registry: ModelRegistry, free_proxy: Arc<dyn ChatAdapter>) -> Self {
        Self {
            registry,
            openai: None,
            gemini: None,
            free_proxy,
        }
    }

    pub fn with_openai(mut self, adapter: Arc<dyn ChatAdapter>) -> Self {
        self.openai = Some(adapter);
        self
    }

    pub fn with_gemini(mut self, adapter: Arc<dyn ChatAdapter>) -> Self {
        self.gemini = Some(adapter);
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn availability(&self) -> Availability {
        Availability {
            openai: self.openai.is_some(),
            gemini: self.gemini.is_some(),
        }
    }

    pub fn select(&self, model: &str) -> ProviderKind {
        select_provider(&self.registry, self.availability(), model)
    }

    /// Single-turn call: `[system, user]`.
    pub async fn generate_response(&self, interaction: &Interaction, content: &str) -> String {
        let messages = history::build_messages(&interaction.settings.prompt, &[], content);
        self.dispatch(&interaction.settings.model, messages).await
    }

    /// Call with the recent history window. Store failures propagate.
    pub async fn generate_with_history<S: MessageStore>(
        &self,
        store: &S,
        interaction: &Interaction,
        content: &str,
    ) -> Result<String, StoreError> {
        let messages = history::assemble(store, interaction, content).await?;
        Ok(self.dispatch(&interaction.settings.model, messages).await)
    }

    async fn dispatch(&self, model: &str, messages: Vec<ChatMessage>) -> String {
        let kind = self.select(model);
        let request = ChatRequest::new(model, messages);

        match self.try_dispatch(kind, &request).await {
            Ok(text) => {
                tracing::info!(provider = kind.name(), model, "provider call succeeded");
                text
            }
            Err(e) => {
                tracing::error!(provider = kind.name(), model, error = ?e, "provider call failed");
                ERROR_SENTINEL.to_string()
            }
        }
    }

    /// Typed-result invocation of an already selected provider.
    pub async fn try_dispatch(
        &self,
        kind: ProviderKind,
        request: &ChatRequest,
    ) -> Result<String, ProviderError> {
        let adapter = match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::FreeProxy => Some(&self.free_proxy),
        }
        .ok_or(ProviderError::NotConfigured(kind.name()))?;

        adapter.call(request).await
    }
}
