//! Escalation: open a high-priority support case for a customer issue.

use concierge_core::backend::CasePriority;
use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};

use super::SpecialistOutcome;
use crate::runner::TaskRunner;
use crate::task::AgentTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub customer_email: String,
    pub issue_description: String,
    /// Low, Medium, High or Critical. Unset means High.
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

impl EscalationRequest {
    pub fn severity(&self) -> &str {
        self.severity.as_deref().unwrap_or("High")
    }

    /// `"ESCALATION: "` plus the first 50 characters of the issue.
    pub fn subject(&self) -> String {
        let head: String = self.issue_description.chars().take(50).collect();
        format!("ESCALATION: {head}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationStatus {
    Escalated,
    EscalationFailed,
}

pub fn persona() -> Persona {
    Persona::new(
        "Customer Escalation Specialist",
        "Handle escalated issues and ensure timely resolution",
        "You are an expert in customer service escalations. You create high-priority \
         cases and route critical issues to the appropriate teams.",
    )
}

pub fn escalation_task(request: &EscalationRequest, tools: &ToolRegistry) -> AgentTask {
    let priority = match CasePriority::parse(request.severity()) {
        CasePriority::Low => "Low",
        CasePriority::Medium => "Medium",
        CasePriority::High => "High",
        CasePriority::Critical => "Critical",
    };
    let description = format!(
        "Escalate this customer issue:\n\
         - Customer: {email}\n\
         - Issue: {issue}\n\
         - Severity: {severity}\n\
         \n\
         Steps:\n\
         1. Create a support case with create_support_case\n\
         2. Set priority to '{priority}'\n\
         3. Subject must be '{subject}'\n\
         4. Include the full issue description\n\
         \n\
         Your answer should confirm the case creation with the case_id.",
        email = request.customer_email,
        issue = request.issue_description,
        severity = request.severity(),
        subject = request.subject(),
    );

    AgentTask::new(persona(), description)
        .with_tools(tools.subset(&[names::CREATE_SUPPORT_CASE]))
        .with_max_iterations(3)
        .with_context("customer_email", &request.customer_email)
        .with_context("severity", request.severity())
}

pub fn parse_escalation_answer(answer: &str) -> EscalationStatus {
    let lower = answer.to_lowercase();
    if lower.contains("success") || lower.contains("case") {
        EscalationStatus::Escalated
    } else {
        EscalationStatus::EscalationFailed
    }
}

pub async fn escalate_issue(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    request: &EscalationRequest,
) -> Result<SpecialistOutcome<EscalationStatus>, AgentError> {
    let report = runner.run(&escalation_task(request, tools)).await?;
    let status = parse_escalation_answer(&report.answer);
    Ok(SpecialistOutcome::from_report(status, report.answer.clone(), &report)
        .with_detail("customer_email", request.customer_email.clone())
        .with_detail("severity", request.severity()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use concierge_backend::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn request(issue: &str) -> EscalationRequest {
        EscalationRequest {
            customer_email: "ana@example.com".into(),
            issue_description: issue.into(),
            severity: None,
            customer_name: None,
        }
    }

    #[test]
    fn subject_truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        assert_eq!(request(&long).subject().len(), "ESCALATION: ".len() + 50);
        assert_eq!(request("late").subject(), "ESCALATION: late");
    }

    #[test]
    fn severity_defaults_to_high() {
        let req = request("late");
        assert_eq!(req.severity(), "High");
        let tools = concierge_tools::default_registry(Arc::new(InMemoryBackend::new()));
        assert!(escalation_task(&req, &tools).description.contains("priority to 'High'"));
    }

    #[tokio::test]
    async fn escalation_creates_case() {
        let backend = Arc::new(InMemoryBackend::new());
        let tools = concierge_tools::default_registry(backend.clone());
        let req = request("Third late delivery this month");
        let provider = SequentialMockProvider::tool_then_answer(
            vec![make_tool_call(
                names::CREATE_SUPPORT_CASE,
                json!({
                    "customer_email": req.customer_email,
                    "subject": req.subject(),
                    "description": req.issue_description,
                    "priority": "High"
                }),
            )],
            "",
            "Created case CASE-00001",
        );
        let runner = TaskRunner::new(Arc::new(provider), "mock-model");

        let outcome = escalate_issue(&runner, &tools, &req).await.unwrap();
        assert_eq!(outcome.status, EscalationStatus::Escalated);
        let cases = backend.support_cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].priority, CasePriority::High);
        assert!(cases[0].subject.starts_with("ESCALATION: "));
    }
}
