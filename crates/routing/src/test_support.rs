//! Test doubles shared by the routing and chat tests.

use std::sync::Mutex;
use std::time::Duration;

use concierge_core::error::ProviderError;
use concierge_core::message::Message;
use concierge_core::provider::{Provider, ProviderRequest, ProviderResponse};

/// Answers every request with the same text, or fails every request.
pub struct ScriptedProvider {
    answer: Option<String>,
    calls: Mutex<usize>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: Mutex::new(0),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Mutex::new(0),
            delay: None,
        }
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.answer {
            Some(answer) => Ok(ProviderResponse {
                message: Message::assistant(answer.as_str()),
                usage: None,
                model: "mock-model".into(),
            }),
            None => Err(ProviderError::Network("connection refused".into())),
        }
    }
}
