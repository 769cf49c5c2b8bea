//! The routing classifier task: a tool-less, single-shot prompt.

use concierge_core::persona::Persona;

use crate::task::AgentTask;

pub fn persona() -> Persona {
    Persona::new(
        "Query Router and Customer Service Coordinator",
        "Analyze customer queries and route them to the appropriate specialist team",
        "You are an expert customer service coordinator with years of experience. \
         You quickly analyze customer queries and determine which specialist team should \
         handle them. You are decisive and efficient, always routing to the most \
         appropriate specialist.",
    )
}

/// Build the classification task for one customer message.
///
/// The model is asked to answer with a single `CATEGORY: <NAME>` line; the
/// routing crate parses whatever comes back.
pub fn classifier_task(message: &str, user: &str, max_iterations: u32) -> AgentTask {
    let description = format!(
        "Analyze this customer query and determine the best specialist to handle it.\n\
         \n\
         Customer: {user}\n\
         Query: \"{message}\"\n\
         \n\
         Available specialists:\n\
         1. ORDER: For \"buy\", \"purchase\", \"place order\", \"new order\", \"where is my order\", \"status\", \"cancel\".\n\
         2. INVENTORY: For \"stock\", \"availability\", \"do you have\", \"when will you have\".\n\
         3. RETURNS: ONLY for \"return\", \"refund\", \"exchange\", \"defective\", \"broken\".\n\
         4. FRAUD: For \"suspicious\", \"unauthorized\", \"hack\", \"security\".\n\
         5. CRM_SYNC: For \"update email\", \"change address\", \"crm\", \"account details\".\n\
         6. ESCALATION: For \"manager\", \"supervisor\", \"complaint\", \"angry\".\n\
         \n\
         Examples:\n\
         - \"I want to buy a laptop\" -> CATEGORY: ORDER\n\
         - \"Do you have stock?\" -> CATEGORY: INVENTORY\n\
         - \"I want to return this\" -> CATEGORY: RETURNS\n\
         - \"Where is my order?\" -> CATEGORY: ORDER\n\
         \n\
         Select exactly one specialist. Reply with a single line of the form \
         \"CATEGORY: <NAME>\" and nothing else."
    );

    AgentTask::new(persona(), description)
        .with_max_iterations(max_iterations)
        .with_context("query", message)
        .with_context("customer_email", user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_task_has_no_tools() {
        let task = classifier_task("Where is order #1001?", "ana@example.com", 1);
        assert!(task.tools.is_empty());
        assert_eq!(task.max_iterations, 1);
        assert!(task.description.contains("\"Where is order #1001?\""));
        assert!(task.description.contains("CRM_SYNC"));
    }
}
