//! Argument extraction shared by the tools.
//!
//! Small models are sloppy with types: ids arrive as `1001`, `"1001"` or
//! `"#1001"`, amounts as numbers or numeric strings. Both are accepted.

use concierge_core::error::{BackendError, ToolError};
use concierge_core::tool::ToolResult;
use serde_json::{Value, json};

pub(crate) fn integer(args: &Value, key: &str) -> Result<i64, ToolError> {
    match &args[key] {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::InvalidArguments(format!("Missing or invalid '{key}' argument")))
}

pub(crate) fn number(args: &Value, key: &str) -> Result<f64, ToolError> {
    match &args[key] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::InvalidArguments(format!("Missing or invalid '{key}' argument")))
}

pub(crate) fn string(args: &Value, key: &str) -> Result<String, ToolError> {
    match &args[key] {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ToolError::InvalidArguments(format!("Missing '{key}' argument"))),
    }
}

/// Map a backend failure onto the tool contract.
///
/// Answers the model can act on (`NotFound`, `Declined`) become unsuccessful
/// results; faults (`Validation`, `Unavailable`) become `ExecutionFailed`.
pub(crate) fn backend_failure(tool_name: &str, err: BackendError) -> Result<ToolResult, ToolError> {
    match err {
        BackendError::NotFound { .. } => Ok(ToolResult::failure(json!({ "error": err.to_string() }))),
        BackendError::Declined(reason) => Ok(ToolResult::failure(json!({
            "status": "failed",
            "error": reason,
        }))),
        other => Err(ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: other.to_string(),
        }),
    }
}
