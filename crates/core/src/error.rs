//! Error types for the Concierge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for Concierge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Backend service errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Session store errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Agent task errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport or model-layer faults raised by a [`crate::Provider`].
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the external commerce services.
///
/// `Unavailable` covers transport faults and transient 5xx responses; it is
/// reported to the user as an apology and never retried by the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Session for '{user}' was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        user: String,
        expected: u64,
        actual: u64,
    },

    #[error("Session storage error: {0}")]
    Storage(String),
}

/// Terminal failures of a tool-calling task.
///
/// `ToolNotFound` and `ToolExecutionFailed` are not variants here: those are
/// fed back to the model as tool results and never end a task.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Model invocation failed at iteration {iteration}: {source}")]
    ModelInvocationFailed {
        iteration: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Task did not finish within {max_iterations} iterations")]
    IterationLimitExceeded {
        max_iterations: u32,
        /// Content of the last model utterance, kept for diagnostics.
        last_content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn backend_not_found_helper() {
        let err = BackendError::not_found("order", 1001);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "order 1001 not found");
        assert!(!BackendError::Unavailable("down".into()).is_not_found());
    }

    #[test]
    fn iteration_limit_keeps_last_content() {
        let err = AgentError::IterationLimitExceeded {
            max_iterations: 3,
            last_content: "still checking stock".into(),
        };
        assert!(err.to_string().contains('3'));
        match err {
            AgentError::IterationLimitExceeded { last_content, .. } => {
                assert_eq!(last_content, "still checking stock");
            }
            _ => unreachable!(),
        }
    }
}
