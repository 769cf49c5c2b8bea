//! The tool-calling loop engine and the specialist tasks built on it.
//!
//! A task runs as a bounded loop:
//!
//! 1. **Seed** the history with the persona (system) and the task description (user)
//! 2. **Invoke** the model with the history and the task's tool schemas
//! 3. **If tool calls**: execute each one in order, append every result, loop back to 2
//! 4. **If text**: that is the final answer
//!
//! The loop stops on the first tool-free answer, a model failure, or when the
//! iteration budget is spent.

pub mod runner;
pub mod specialists;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use runner::{TaskReport, TaskRunner, EMPTY_ANSWER_SENTINEL};
pub use specialists::{ItemQuantity, SpecialistOutcome};
pub use task::{AgentTask, DEFAULT_MAX_ITERATIONS};
