// Conversation data model
//
// Interactions own an ordered list of messages and carry the settings
// (model, system role, system prompt) used for every provider call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PROMPT: &str = "You are an assistant.";
pub const SYSTEM_ROLE: &str = "system";

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Per-interaction provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Model identifier, matched against the model registry
    pub model: String,
    /// Always "system"
    #[serde(default = "default_role")]
    pub role: String,
    /// System instruction sent ahead of every conversation
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_role() -> String {
    SYSTEM_ROLE.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Settings {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            role: default_role(),
            prompt: prompt.into(),
        }
    }
}

/// A stored conversation turn
///
/// Immutable once created. `content` is kept as plain text in storage; the
/// HTTP layer may re-shape it (see [`crate::utils::jsonify`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A message that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat session with fixed settings and an ordered history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settings: Settings,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("human".parse::<Role>().is_err());
    }

    #[test]
    fn test_settings_defaults_when_fields_missing() {
        let settings: Settings = serde_json::from_str(r#"{"model":"gpt-4"}"#).unwrap();
        assert_eq!(settings.role, "system");
        assert_eq!(settings.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&NewMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
