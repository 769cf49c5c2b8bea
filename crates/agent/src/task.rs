//! AgentTask — one bounded unit of work for the tool-calling loop.

use concierge_core::message::Message;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;

/// Iteration budget used when a task doesn't set one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// A persona, a tool subset, an iteration budget and the work to do.
///
/// Built per invocation and dropped when the loop returns.
#[derive(Debug, Clone)]
pub struct AgentTask {
    pub persona: Persona,
    pub tools: ToolRegistry,
    pub max_iterations: u32,
    pub description: String,
    /// Ordered key → value pairs appended to the user prompt.
    pub context: Vec<(String, String)>,
}

impl AgentTask {
    pub fn new(persona: Persona, description: impl Into<String>) -> Self {
        Self {
            persona,
            tools: ToolRegistry::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            description: description.into(),
            context: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Set the iteration budget. Zero is raised to one.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    /// The task description followed by the serialized context, if any.
    pub fn user_prompt(&self) -> String {
        if self.context.is_empty() {
            return self.description.clone();
        }
        let mut prompt = format!("{}\n\nContext:", self.description);
        for (key, value) in &self.context {
            prompt.push_str(&format!("\n- {key}: {value}"));
        }
        prompt
    }

    /// `[System(persona), User(description + context)]`.
    pub fn initial_history(&self) -> Vec<Message> {
        vec![
            Message::system(self.persona.render()),
            Message::user(self.user_prompt()),
        ]
    }
}
