// Configuration structs
//
// Every field has a default so an empty (or absent) config file yields a
// working local setup.

use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_TOKEN_MINUTES;
use crate::providers::registry::ModelRegistry;
use crate::providers::{free_proxy, gemini, openai, ProviderCredentials};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP address for `ai3d serve`
    pub bind_address: String,

    /// sqlx connection string
    pub database_url: String,

    /// `tracing` filter, e.g. `"info"` or `"debug,tower_http=warn"`
    pub log_level: String,

    /// Emit newline-delimited JSON log records
    pub log_json: bool,

    pub auth: AuthConfig,

    pub providers: ProvidersConfig,

    /// Model registry overrides (`[models]` table)
    pub models: ModelRegistry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            database_url: "sqlite://ai3d.db".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            auth: AuthConfig::default(),
            providers: ProvidersConfig::default(),
            models: ModelRegistry::default(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing key. Generated per process when left empty.
    pub secret_key: String,
    pub access_token_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_minutes: DEFAULT_TOKEN_MINUTES,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &redact(Some(&self.secret_key)))
            .field("access_token_minutes", &self.access_token_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Provider endpoints and credentials
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub free_proxy_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
            free_proxy_url: free_proxy::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ProvidersConfig {
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            openai_api_key: self.openai_api_key.clone().filter(|k| !k.is_empty()),
            gemini_api_key: self.gemini_api_key.clone().filter(|k| !k.is_empty()),
        }
    }
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("openai_api_key", &redact(self.openai_api_key.as_deref()))
            .field("openai_base_url", &self.openai_base_url)
            .field("gemini_api_key", &redact(self.gemini_api_key.as_deref()))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("free_proxy_url", &self.free_proxy_url)
            .finish()
    }
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "<set>",
        _ => "<unset>",
    }
}
