//! The tool-calling loop.
//!
//! A [`TaskRunner`] drives one [`AgentTask`] through alternating model
//! invocations and tool executions until the model answers without
//! requesting tools or the iteration budget runs out.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use concierge_config::AppConfig;
use concierge_core::error::{AgentError, ProviderError};
use concierge_core::event::{DomainEvent, EventBus};
use concierge_core::message::{Message, MessageToolCall};
use concierge_core::provider::{Provider, ProviderRequest};
use concierge_core::tool::{ToolRegistry, ToolResult};
use futures::FutureExt;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::task::AgentTask;

/// Final answer used when the model stops calling tools but says nothing.
pub const EMPTY_ANSWER_SENTINEL: &str = "Task completed (no final answer provided)";

/// What a successful task produced.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub answer: String,
    /// Model invocations made, including the final one.
    pub iterations: u32,
    pub tool_calls_made: usize,
    /// The full history, system message first.
    pub history: Vec<Message>,
}

/// Runs tasks against one provider and model.
///
/// Stateless between runs, so one runner can serve any number of tasks
/// concurrently.
pub struct TaskRunner {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    model_timeout: Duration,
    /// Ceiling applied on top of each task's own budget.
    iteration_ceiling: Option<u32>,
    event_bus: Arc<EventBus>,
}

impl TaskRunner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            model_timeout: Duration::from_secs(60),
            iteration_ceiling: None,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Model, sampling and timeout settings from the loaded config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let mut runner = Self::new(provider, config.default_model.clone())
            .with_temperature(config.default_temperature)
            .with_model_timeout(config.agent.model_timeout())
            .with_iteration_ceiling(config.agent.max_iterations);
        runner.max_tokens = config.default_max_tokens;
        runner
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Upper bound on a single model invocation.
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    /// No task runs more iterations than this, whatever it asks for.
    pub fn with_iteration_ceiling(mut self, ceiling: u32) -> Self {
        self.iteration_ceiling = Some(ceiling.max(1));
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Drive `task` to a final answer.
    ///
    /// Model failures end the run at once and are never retried. Tool
    /// faults, including a missing tool or a panicking one, become error
    /// results in the history for the model to react to.
    pub async fn run(&self, task: &AgentTask) -> Result<TaskReport, AgentError> {
        let mut history = task.initial_history();
        let tool_definitions = task.tools.definitions();
        let mut tool_calls_made = 0usize;
        let mut last_content = String::new();
        let mut seen_call_ids = HashSet::new();
        let max_iterations = self
            .iteration_ceiling
            .map_or(task.max_iterations, |ceiling| task.max_iterations.min(ceiling));

        info!(
            role = %task.persona.role,
            tools = task.tools.len(),
            max_iterations,
            "Starting task"
        );

        for iteration in 1..=max_iterations {
            debug!(iteration, messages = history.len(), "Task loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: history.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = match tokio::time::timeout(self.model_timeout, self.provider.complete(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(source)) => return Err(self.model_failure(iteration, source)),
                Err(_) => {
                    let source = ProviderError::Timeout(format!(
                        "no response from {} within {}s",
                        self.provider.name(),
                        self.model_timeout.as_secs()
                    ));
                    return Err(self.model_failure(iteration, source));
                }
            };

            let mut message = response.message;
            for call in &mut message.tool_calls {
                if !seen_call_ids.insert(call.id.clone()) {
                    let fresh = MessageToolCall::fresh_id();
                    debug!(tool = %call.name, repeated = %call.id, id = %fresh, "Reassigned repeated tool call id");
                    call.id = fresh.clone();
                    seen_call_ids.insert(fresh);
                }
            }
            last_content = message.content.clone();
            let tool_calls = message.tool_calls.clone();
            history.push(message);

            if tool_calls.is_empty() {
                let answer = if last_content.trim().is_empty() {
                    EMPTY_ANSWER_SENTINEL.to_string()
                } else {
                    last_content
                };

                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    context: task.persona.role.clone(),
                    iterations: iteration,
                    tool_calls: tool_calls_made,
                    timestamp: Utc::now(),
                });
                info!(iteration, tool_calls = tool_calls_made, "Task finished");

                return Ok(TaskReport {
                    answer,
                    iterations: iteration,
                    tool_calls_made,
                    history,
                });
            }

            debug!(count = tool_calls.len(), "Executing tool calls");
            for call in &tool_calls {
                let content = self.execute_call(&task.tools, call).await;
                history.push(Message::tool_result(&call.id, content));
                tool_calls_made += 1;
            }
        }

        warn!(
            max_iterations,
            tool_calls = tool_calls_made,
            "Iteration limit reached without a final answer"
        );
        Err(AgentError::IterationLimitExceeded {
            max_iterations,
            last_content,
        })
    }

    fn model_failure(&self, iteration: u32, source: ProviderError) -> AgentError {
        warn!(iteration, provider = self.provider.name(), error = %source, "Model invocation failed");
        self.event_bus.publish(DomainEvent::ErrorOccurred {
            context: "model_invocation".into(),
            error_message: source.to_string(),
            timestamp: Utc::now(),
        });
        AgentError::ModelInvocationFailed { iteration, source }
    }

    /// Execute one requested call and render its result payload.
    async fn execute_call(&self, tools: &ToolRegistry, call: &MessageToolCall) -> String {
        let start = Instant::now();

        let Some(tool) = tools.get(&call.name) else {
            warn!(tool = %call.name, "Model requested an unavailable tool");
            self.publish_tool_event(&call.name, false, start);
            return json!({
                "error": format!("Tool '{}' not found", call.name),
                "kind": "ToolNotFound",
            })
            .to_string();
        };

        let arguments = if call.arguments.trim().is_empty() {
            Ok(json!({}))
        } else {
            serde_json::from_str::<serde_json::Value>(&call.arguments)
        };
        let arguments = match arguments {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool arguments are not valid JSON");
                self.publish_tool_event(&call.name, false, start);
                return execution_failed(format!("invalid arguments: {e}"));
            }
        };

        let outcome = AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await;
        let (success, content) = match outcome {
            Ok(Ok(result)) if result.success => (true, result.output),
            Ok(Ok(result)) => (false, reported_failure(result)),
            Ok(Err(e)) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                (false, execution_failed(e.to_string()))
            }
            Err(_) => {
                warn!(tool = %call.name, "Tool panicked");
                (false, execution_failed(format!("tool '{}' panicked", call.name)))
            }
        };

        self.publish_tool_event(&call.name, success, start);
        content
    }

    fn publish_tool_event(&self, tool_name: &str, success: bool, start: Instant) {
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: tool_name.to_string(),
            success,
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
    }
}

fn execution_failed(reason: String) -> String {
    json!({ "error": reason, "kind": "ToolExecutionFailed" }).to_string()
}

/// A fault the tool reported itself, tagged like a raised one.
fn reported_failure(result: ToolResult) -> String {
    match result.data {
        Some(serde_json::Value::Object(mut payload)) => {
            payload.insert("kind".into(), json!("ToolExecutionFailed"));
            serde_json::Value::Object(payload).to_string()
        }
        Some(other) => json!({ "error": other, "kind": "ToolExecutionFailed" }).to_string(),
        None => execution_failed(result.output),
    }
}
