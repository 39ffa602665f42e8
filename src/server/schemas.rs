// Request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::conversation::{Message, Role, DEFAULT_PROMPT, SYSTEM_ROLE};
use crate::store::{UserRecord, UserRole};
use crate::utils::jsonify;

/// A user as returned by the API; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserOut {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
    pub role: UserRole,
}

impl From<UserRecord> for UserOut {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// OAuth2 password-flow form body
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `?model=` on interaction creation
#[derive(Debug, Default, Deserialize)]
pub struct ChatModelQuery {
    pub model: Option<String>,
}

/// System instruction supplied when creating an interaction
#[derive(Debug, Deserialize)]
pub struct Instruction {
    #[serde(default = "system_role")]
    pub role: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            role: system_role(),
            prompt: default_prompt(),
        }
    }
}

fn system_role() -> String {
    SYSTEM_ROLE.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MessageCreate {
    #[serde(default = "user_role")]
    pub role: String,
    pub content: String,
}

fn user_role() -> String {
    Role::User.as_str().to_string()
}

/// A message as returned by the API
///
/// `content` is a JSON value so replies that parse as JSON are returned
/// structured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageOut {
    pub id: Uuid,
    pub role: Role,
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

impl MessageOut {
    pub fn plain(message: Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: Value::String(message.content),
            created_at: message.created_at,
        }
    }

    pub fn jsonified(message: Message) -> Self {
        Self {
            content: jsonify(&message.content),
            ..Self::plain(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_defaults() {
        let instruction: Instruction = serde_json::from_str("{}").unwrap();
        assert_eq!(instruction.role, "system");
        assert_eq!(instruction.prompt, "You are an assistant.");
    }

    #[test]
    fn test_message_create_defaults_to_user() {
        let message: MessageCreate = serde_json::from_str(r#"{"content":"Hello"}"#).unwrap();
        assert_eq!(message.role, "user");
    }

    #[test]
    fn test_user_out_has_no_password() {
        let out = UserOut::from(UserRecord {
            id: Uuid::new_v4(),
            username: "user1".into(),
            full_name: None,
            email: None,
            password: "$2b$hash".into(),
            disabled: false,
            role: UserRole::User,
        });
        let json = serde_json::to_string(&out).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$hash"));
    }

    #[test]
    fn test_message_out_jsonified() {
        let message = Message {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: r#"{"vertices": 8}"#.into(),
            created_at: Utc::now(),
        };
        assert_eq!(
            MessageOut::plain(message.clone()).content,
            Value::String(r#"{"vertices": 8}"#.into())
        );
        assert_eq!(
            MessageOut::jsonified(message).content,
            serde_json::json!({"vertices": 8})
        );
    }
}
