//! Configuration loading, validation, and management for Concierge.
//!
//! Loads configuration from `~/.concierge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.concierge/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per model response (unset = provider default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.2:1b".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("agent", &self.agent)
            .field("routing", &self.routing)
            .field("chat", &self.chat)
            .field("backend", &self.backend)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Tool-calling loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Ceiling on any task's iteration budget
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Upper bound on a single model invocation
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_model_timeout_secs() -> u64 {
    60
}

impl AgentConfig {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            model_timeout_secs: default_model_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Iteration cap for the classifier task
    #[serde(default = "default_classifier_iterations")]
    pub classifier_max_iterations: u32,
}

fn default_classifier_iterations() -> u32 {
    1
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            classifier_max_iterations: default_classifier_iterations(),
        }
    }
}

/// Conversation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Turns retained per session (oldest dropped first)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Age after which an unconfirmed pending action is discarded.
    /// Unset = pending actions never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action_ttl_secs: Option<u64>,

    /// Customer id used when creating orders from chat
    #[serde(default = "default_customer_id")]
    pub default_customer_id: i64,

    /// Upper bound on handling a single chat message
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
}

fn default_history_limit() -> usize {
    10
}
fn default_customer_id() -> i64 {
    1
}
fn default_reply_timeout_secs() -> u64 {
    120
}

impl ChatConfig {
    pub fn pending_action_ttl(&self) -> Option<Duration> {
        self.pending_action_ttl_secs.map(Duration::from_secs)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            pending_action_ttl_secs: None,
            default_customer_id: default_customer_id(),
            reply_timeout_secs: default_reply_timeout_secs(),
        }
    }
}

/// Which commerce backend implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// HTTP calls to the service gateway
    #[default]
    Http,
    /// Seeded in-process catalogue
    InMemory,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,

    /// Service gateway base URL
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-call timeout
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token forwarded to the service gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_backend_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_backend_timeout_secs() -> u64 {
    30
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("auth_token", &redact(&self.auth_token))
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::default(),
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8002
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.concierge/config.toml).
    ///
    /// Environment overrides, highest priority first:
    /// - `CONCIERGE_API_KEY`, then `OPENAI_API_KEY` (only when no key is configured)
    /// - `CONCIERGE_PROVIDER`
    /// - `CONCIERGE_MODEL`
    /// - `CONCIERGE_BACKEND_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("CONCIERGE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(provider) = lookup("CONCIERGE_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("CONCIERGE_MODEL") {
            self.default_model = model;
        }
        if let Some(url) = lookup("CONCIERGE_BACKEND_URL") {
            self.backend.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".concierge")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.routing.classifier_max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "routing.classifier_max_iterations must be at least 1".into(),
            ));
        }
        if self.chat.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "chat.history_limit must be at least 1".into(),
            ));
        }
        if self.backend.mode == BackendMode::Http
            && !(self.backend.base_url.starts_with("http://")
                || self.backend.base_url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            )));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            providers: HashMap::new(),
            agent: AgentConfig::default(),
            routing: RoutingConfig::default(),
            chat: ChatConfig::default(),
            backend: BackendConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
