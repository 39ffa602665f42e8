// Configuration loader
// Reads AI3D_CONFIG or ~/.ai3d/config.toml (optional), then environment overrides

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;
use crate::errors::{self, UserFriendlyError};

/// Where the config file is looked up: `AI3D_CONFIG`, else `~/.ai3d/config.toml`
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = non_empty_env("AI3D_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".ai3d").join("config.toml"))
}

/// Load the process configuration.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_config() -> Result<Config> {
    let mut config = match config_path() {
        Some(path) if path.exists() => load_config_from(&path)?,
        Some(path) => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, non_empty_env);
    Ok(config)
}

/// Parse one TOML file without applying environment overrides.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .user_context_with_suggestion(
            &format!("Failed to read config file {}", path.display()),
            "Check that the file is readable, or point AI3D_CONFIG at another file",
        )?;

    toml::from_str(&contents).map_err(|e| anyhow::anyhow!(errors::config_parse_error(path, &e)))
}

/// Apply overrides from `lookup`; `lookup` returns `None` for unset keys.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("OPENAI_API_KEY") {
        config.providers.openai_api_key = Some(v);
    }
    if let Some(v) = lookup("GEMINI_API_KEY") {
        config.providers.gemini_api_key = Some(v);
    }
    if let Some(v) = lookup("AI3D_FREE_PROXY_URL") {
        config.providers.free_proxy_url = v;
    }
    if let Some(v) = lookup("AI3D_DATABASE_URL") {
        config.database_url = v;
    }
    if let Some(v) = lookup("AI3D_BIND") {
        config.bind_address = v;
    }
    if let Some(v) = lookup("AI3D_SECRET_KEY") {
        config.auth.secret_key = v;
    }
    if let Some(v) = lookup("AI3D_LOG") {
        config.log_level = v;
    }
    if let Some(v) = lookup("AI3D_LOG_JSON") {
        config.log_json = v == "1" || v.eq_ignore_ascii_case("true");
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
bind_address = "0.0.0.0:9000"

[providers]
openai_api_key = "sk-file"

[models]
default = "gpt-4"
"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.models.default_model(), "gpt-4");
        // untouched sections keep their defaults
        assert_eq!(config.database_url, Config::default().database_url);
        assert!(config.models.is_gemini("gemini-pro"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = ").unwrap();

        let err = load_config_from(file.path()).unwrap_err().to_string();
        assert!(err.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file_is_an_error_when_named_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
        let rendered = format!("{:#}", err);
        assert!(rendered.contains("absent.toml"));
        assert!(rendered.contains("AI3D_CONFIG"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("AI3D_DATABASE_URL", "sqlite::memory:"),
            ("AI3D_LOG_JSON", "TRUE"),
            ("AI3D_BIND", "0.0.0.0:1234"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.providers.gemini_api_key, None);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_address, "0.0.0.0:1234");
        assert!(config.log_json);
    }
}
