//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, Ollama, vLLM, llama.cpp, Groq, OpenRouter and any
//! endpoint exposing `/v1/chat/completions` with function calling.

use std::time::Duration;

use async_trait::async_trait;
use concierge_core::error::ProviderError;
use concierge_core::message::{Message, MessageToolCall, Role};
use concierge_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completions provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(name, base_url, api_key, Duration::from_secs(120))
    }

    /// Create a provider whose every HTTP call is bounded by `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client,
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Ollama needs no real key.
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
        )
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: serde_json::Value::String(tc.arguments.clone()),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(format!("{} after {}s", self.name, self.timeout.as_secs()))
        } else {
            ProviderError::Network(e.to_string())
        }
    }

    /// Convert a wire tool call. Some servers send `arguments` as an object
    /// rather than a JSON-encoded string; both are normalized to a string.
    /// Missing ids are synthesized so every request stays correlatable.
    fn to_tool_call(call: ApiToolCall) -> MessageToolCall {
        let arguments = match call.function.arguments {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => "{}".to_string(),
            other => other.to_string(),
        };
        let id = if call.id.is_empty() {
            MessageToolCall::fresh_id()
        } else {
            call.id
        };
        MessageToolCall {
            id,
            name: call.function.name,
            arguments,
        }
    }
}

#[async_trait]
impl concierge_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(Self::to_tool_call)
            .collect();

        let content = choice.message.content.unwrap_or_default();
        let message = Message::assistant_with_tool_calls(content, tool_calls);

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::{get, post}};
    use concierge_core::Provider;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "llama3.2:1b".into(),
            messages: vec![Message::system("You are helpful"), Message::user("Stock of item 1?")],
            temperature: 0.0,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url.contains("localhost:11434"));
    }

    #[test]
    fn message_conversion_keeps_tool_correlation() {
        let messages = vec![
            Message::system("You are helpful"),
            Message::assistant_with_tool_calls(
                "",
                vec![MessageToolCall {
                    id: "call_1".into(),
                    name: "check_inventory".into(),
                    arguments: r#"{"product_id":1}"#.into(),
                }],
            ),
            Message::tool_result("call_1", r#"{"stock":4}"#),
        ];
        let api = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].tool_calls.as_ref().unwrap()[0].id, "call_1");
        assert_eq!(api[2].role, "tool");
        assert_eq!(api[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDefinition {
            name: "check_inventory".into(),
            description: "Check stock".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatProvider::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "check_inventory");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn object_arguments_are_normalized_to_string() {
        let call: ApiToolCall = serde_json::from_value(serde_json::json!({
            "function": { "name": "check_inventory", "arguments": { "product_id": 1 } }
        }))
        .unwrap();
        let converted = OpenAiCompatProvider::to_tool_call(call);
        assert_eq!(converted.arguments, r#"{"product_id":1}"#);
        assert!(converted.id.starts_with("call_"));
    }

    #[tokio::test]
    async fn complete_parses_tool_calls() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(serde_json::json!({
                    "model": "llama3.2:1b",
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_abc",
                                "type": "function",
                                "function": { "name": "check_inventory", "arguments": "{\"product_id\":1}" }
                            }]
                        }
                    }],
                    "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
                }))
            }),
        );
        let base = serve(app).await;
        let provider = OpenAiCompatProvider::new("test", base, "key");

        let response = provider.complete(request()).await.unwrap();
        assert!(response.message.requests_tools());
        assert_eq!(response.message.tool_calls[0].id, "call_abc");
        assert_eq!(response.message.content, "");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn health_check_hits_models_endpoint() {
        let app = Router::new().route("/v1/models", get(|| async { Json(serde_json::json!({ "data": [] })) }));
        let base = serve(app).await;
        assert!(OpenAiCompatProvider::new("test", base, "key").health_check().await.unwrap());

        let base = serve(Router::new()).await;
        assert!(!OpenAiCompatProvider::new("test", base, "key").health_check().await.unwrap());
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
        );
        let base = serve(app).await;
        let provider = OpenAiCompatProvider::new("test", base, "key");

        let err = provider.complete(request()).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("model crashed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let base = serve(app).await;
        let provider = OpenAiCompatProvider::new("test", base, "bad");
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let base = serve(app).await;
        let provider =
            OpenAiCompatProvider::with_timeout("test", base, "key", Duration::from_millis(100));
        assert!(matches!(
            provider.complete(request()).await,
            Err(ProviderError::Timeout(_))
        ));
    }
}
