// Dispatcher factory
//
// Builds adapters from configuration. An OpenAI or Gemini adapter is only
// created when its credential is present; the free proxy always is.

use std::sync::Arc;

use super::free_proxy::FreeProxyAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiAdapter;
use super::{Dispatcher, ProviderError};
use crate::config::Config;

pub fn create_dispatcher(config: &Config) -> Result<Dispatcher, ProviderError> {
    let providers = &config.providers;
    let credentials = providers.credentials();

    let free_proxy = FreeProxyAdapter::new(providers.free_proxy_url.clone())?;
    let mut dispatcher = Dispatcher::new(config.models.clone(), Arc::new(free_proxy));

    if let Some(key) = credentials.openai() {
        let adapter = OpenAiAdapter::new(key, providers.openai_base_url.clone())?;
        dispatcher = dispatcher.with_openai(Arc::new(adapter));
    }

    if let Some(key) = credentials.gemini() {
        let adapter = GeminiAdapter::new(key, providers.gemini_base_url.clone())?;
        dispatcher = dispatcher.with_gemini(Arc::new(adapter));
    }

    let available = dispatcher.availability();
    tracing::info!(
        openai = available.openai,
        gemini = available.gemini,
        free_proxy = %providers.free_proxy_url,
        "providers configured"
    );

    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    #[test]
    fn test_no_credentials_only_proxy() {
        let dispatcher = create_dispatcher(&Config::default()).unwrap();
        assert!(!dispatcher.availability().openai);
        assert!(!dispatcher.availability().gemini);
        assert_eq!(dispatcher.select("gpt-4"), ProviderKind::FreeProxy);
    }

    #[test]
    fn test_credentials_enable_adapters() {
        let mut config = Config::default();
        config.providers.openai_api_key = Some("sk-test".into());
        config.providers.gemini_api_key = Some("g-test".into());

        let dispatcher = create_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.select("gpt-4"), ProviderKind::OpenAi);
        assert_eq!(dispatcher.select("gemini-pro"), ProviderKind::Gemini);
    }

    #[test]
    fn test_empty_key_does_not_enable_adapter() {
        let mut config = Config::default();
        config.providers.openai_api_key = Some(String::new());

        let dispatcher = create_dispatcher(&config).unwrap();
        assert!(!dispatcher.availability().openai);
    }
}
