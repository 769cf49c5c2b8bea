//! Persona — the role/goal/background triple that becomes a task's system message.

use serde::{Deserialize, Serialize};

/// The persona a specialist task runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub background: String,
}

impl Persona {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            background: background.into(),
        }
    }

    /// Render the system prompt for this persona.
    pub fn render(&self) -> String {
        format!(
            "You are {role}.\n\n\
             Your goal: {goal}\n\n\
             Background: {background}\n\n\
             You have access to tools to help you accomplish your tasks. \
             Use them when needed, then give your final answer in plain text.",
            role = self.role,
            goal = self.goal,
            background = self.background,
        )
    }
}
