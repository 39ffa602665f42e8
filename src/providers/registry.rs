// Model registry: which provider family serves a model id

use serde::{Deserialize, Serialize};

use super::free_proxy;

pub const DEFAULT_OPENAI_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-1106",
    "gpt-4",
    "gpt-4-1106-preview",
    "gpt-4-turbo-preview",
];
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";

/// Static classification of model identifiers
///
/// Built once at startup and never mutated. Anything that is neither
/// OpenAI-compatible nor the Gemini id belongs to the free-proxy bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRegistry {
    pub openai: Vec<String>,
    pub gemini: String,
    #[serde(rename = "default")]
    pub default_model: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            openai: DEFAULT_OPENAI_MODELS.iter().map(|m| m.to_string()).collect(),
            gemini: DEFAULT_GEMINI_MODEL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelRegistry {
    pub fn is_openai_compatible(&self, model: &str) -> bool {
        self.openai.iter().any(|m| m == model)
    }

    pub fn is_gemini(&self, model: &str) -> bool {
        self.gemini == model
    }

    /// Accepted when creating or updating an interaction.
    pub fn is_known(&self, model: &str) -> bool {
        self.is_openai_compatible(model)
            || self.is_gemini(model)
            || free_proxy::proxy_model_name(model).is_some()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// All accepted ids, deduplicated, in registry order
    pub fn known_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::new();
        let configured = self
            .openai
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.gemini.as_str()));
        for model in configured {
            if !models.contains(&model) {
                models.push(model);
            }
        }
        for model in free_proxy::supported_models() {
            if !models.contains(&model) {
                models.push(model);
            }
        }
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let registry = ModelRegistry::default();
        assert!(registry.is_openai_compatible("gpt-4-1106-preview"));
        assert!(!registry.is_openai_compatible("gemini-pro"));
        assert!(registry.is_gemini("gemini-pro"));
        assert!(!registry.is_gemini("gpt-4"));
        assert_eq!(registry.default_model(), "gpt-4-1106-preview");
    }

    #[test]
    fn test_classification_is_stable() {
        let registry = ModelRegistry::default();
        for model in ["gpt-4", "gemini-pro", "mixtral-8x7b", ""] {
            assert_eq!(
                registry.is_openai_compatible(model),
                registry.is_openai_compatible(model)
            );
            assert_eq!(registry.is_gemini(model), registry.is_gemini(model));
        }
        assert_eq!(registry, ModelRegistry::default());
    }

    #[test]
    fn test_is_known_includes_proxy_table() {
        let registry = ModelRegistry::default();
        assert!(registry.is_known("mixtral-8x7b"));
        assert!(registry.is_known("gemini-pro"));
        assert!(!registry.is_known("made-up"));
    }

    #[test]
    fn test_known_models_deduplicated() {
        let registry = ModelRegistry::default();
        let models = registry.known_models();
        let gpt4 = models.iter().filter(|m| **m == "gpt-4").count();
        assert_eq!(gpt4, 1);
        assert_eq!(models[0], "gpt-3.5-turbo");
    }

    #[test]
    fn test_known_models_include_configured_and_proxy_ids() {
        let registry = ModelRegistry {
            openai: vec!["my-local-gpt".to_string()],
            gemini: "gemini-custom".to_string(),
            default_model: "my-local-gpt".to_string(),
        };
        let models = registry.known_models();
        assert_eq!(&models[..2], &["my-local-gpt", "gemini-custom"]);
        assert!(models.contains(&"mixtral-8x7b"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModelRegistry {
            openai: vec![],
            gemini: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
        };
        assert!(!registry.is_openai_compatible("gpt-4"));
        assert!(registry.is_known("gpt-4"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let registry: ModelRegistry = toml::from_str(r#"gemini = "gemini-1.0-pro""#).unwrap();
        assert_eq!(registry.gemini, "gemini-1.0-pro");
        assert_eq!(registry.default_model, DEFAULT_MODEL);
        assert_eq!(registry.openai.len(), DEFAULT_OPENAI_MODELS.len());
    }
}
