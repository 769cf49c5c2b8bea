//! Message types exchanged with the model during a task.
//!
//! A task's history is an append-only `Vec<Message>`:
//! System → User → (Assistant [+ tool calls] → Tool results…)* → Assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a task history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The requester (task description or customer text)
    User,
    /// The model
    Assistant,
    /// Rendered persona instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a task history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Whether this is an assistant message requesting at least one tool call.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Correlation id, echoed by exactly one tool result
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

impl MessageToolCall {
    /// A new random correlation id in the `call_<hex>` form.
    pub fn fresh_id() -> String {
        format!("call_{}", Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Where is order #1001?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Where is order #1001?");
        assert!(msg.tool_calls.is_empty());
        assert!(!msg.requests_tools());
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call_7", "{\"stock\":3}");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn assistant_with_calls_requests_tools() {
        let msg = Message::assistant_with_tool_calls(
            "",
            vec![MessageToolCall {
                id: "c1".into(),
                name: "check_inventory".into(),
                arguments: "{\"product_id\":1}".into(),
            }],
        );
        assert!(msg.requests_tools());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::system("persona")).unwrap();
        assert!(json.contains("\"role\":\"system\""));
        assert!(!json.contains("tool_calls"));
    }
}
