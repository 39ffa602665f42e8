// Provider-agnostic request types

use serde::{Deserialize, Serialize};

use crate::conversation::Role;

/// One `{role, content}` entry sent to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Assembled conversation for one provider call
///
/// Built as `[system, ...history, user]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }

    /// Content of the leading system entry, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the trailing user entry, if any
    pub fn latest_user_content(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Which adapter serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    FreeProxy,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::FreeProxy => "free_proxy",
        }
    }
}

/// API keys read once at startup; empty strings count as absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl ProviderCredentials {
    pub fn openai(&self) -> Option<&str> {
        self.openai_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn gemini(&self) -> Option<&str> {
        self.gemini_api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Which credentialed providers can be selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    pub openai: bool,
    pub gemini: bool,
}

impl From<&ProviderCredentials> for Availability {
    fn from(credentials: &ProviderCredentials) -> Self {
        Self {
            openai: credentials.openai().is_some(),
            gemini: credentials.gemini().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accessors() {
        let request = ChatRequest::new(
            "gpt-4",
            vec![
                ChatMessage::system("P"),
                ChatMessage::assistant("earlier"),
                ChatMessage::user("c"),
            ],
        );
        assert_eq!(request.system_prompt(), Some("P"));
        assert_eq!(request.latest_user_content(), Some("c"));

        let empty = ChatRequest::new("gpt-4", vec![]);
        assert_eq!(empty.system_prompt(), None);
        assert_eq!(empty.latest_user_content(), None);
    }

    #[test]
    fn test_empty_credentials_are_absent() {
        let credentials = ProviderCredentials {
            openai_api_key: Some(String::new()),
            gemini_api_key: Some("g".into()),
        };
        let availability = Availability::from(&credentials);
        assert!(!availability.openai);
        assert!(availability.gemini);
    }

    #[test]
    fn test_chat_message_wire_shape() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be brief"}));
    }
}
