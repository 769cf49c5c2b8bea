//! Provider router — selects the configured model provider.

use std::collections::HashMap;
use std::sync::Arc;

use concierge_config::AppConfig;
use concierge_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Named providers plus the default one.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Every provider is OpenAI-compatible and bounded by `agent.model_timeout_secs`.
/// The default provider is always registered, configured or not.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let timeout = config.agent.model_timeout();

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_else(|| placeholder_key(name));

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::with_timeout(name, base_url, api_key, timeout)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let name = &config.default_provider;
        let api_key = config.api_key.clone().unwrap_or_else(|| placeholder_key(name));
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::with_timeout(
                name,
                default_base_url(name),
                api_key,
                timeout,
            )),
        );
    }

    router
}

fn placeholder_key(provider_name: &str) -> String {
    match provider_name {
        "ollama" => "ollama".into(),
        _ => String::new(),
    }
}

/// Default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => "http://localhost:11434/v1".into(),
    }
}
