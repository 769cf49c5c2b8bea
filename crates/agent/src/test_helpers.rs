//! Shared test helpers for loop and specialist tests.

use std::sync::Mutex;
use std::time::Duration;

use concierge_core::error::ProviderError;
use concierge_core::message::{Message, MessageToolCall};
use concierge_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Once the queue is empty it returns the configured
/// error, or panics if there is none.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    error: Option<ProviderError>,
    delay: Option<Duration>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            error: None,
            delay: None,
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// Create a provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    /// Fail with `error` once the scripted responses run out.
    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sleep before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        let responses = self.responses.lock().unwrap();
        match responses.get(call) {
            Some(response) => Ok(response.clone()),
            None => match &self.error {
                Some(error) => Err(error.clone()),
                None => panic!(
                    "SequentialMockProvider: no more responses (call #{call}, have {})",
                    responses.len()
                ),
            },
        }
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tool_calls(thought, tool_calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    make_tool_call_with_id(&format!("call_{name}"), name, args)
}

pub fn make_tool_call_with_id(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}
