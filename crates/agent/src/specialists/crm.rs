//! CRM synchronization: record a customer account change as a support case.

use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};

use super::SpecialistOutcome;
use crate::runner::TaskRunner;
use crate::task::AgentTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmSyncRequest {
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// What the customer asked to change.
    #[serde(default)]
    pub update: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrmSyncStatus {
    Synced,
    SyncFailed,
}

pub fn persona() -> Persona {
    Persona::new(
        "CRM Integration Specialist",
        "Keep customer data synchronized with the CRM",
        "You are an expert in CRM integration and data synchronization. You ensure \
         customer information is accurately maintained in the CRM.",
    )
}

pub fn crm_sync_task(request: &CrmSyncRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Sync this customer to the CRM:\n\
         - Email: {email}\n\
         - Name: {name}\n\
         - Requested update: {update}\n\
         \n\
         Use create_support_case with subject 'Account update request', priority \
         'Medium' and the requested update as the description.\n\
         Your answer should say whether the sync was successful and include the case_id.",
        email = request.customer_email,
        name = request.customer_name.as_deref().unwrap_or("Unknown"),
        update = request.update.as_deref().unwrap_or("Refresh customer record"),
    );

    AgentTask::new(persona(), description)
        .with_tools(tools.subset(&[names::CREATE_SUPPORT_CASE]))
        .with_max_iterations(3)
        .with_context("customer_email", &request.customer_email)
}

pub fn parse_crm_answer(answer: &str) -> CrmSyncStatus {
    let lower = answer.to_lowercase();
    if ["success", "created", "exists"].iter().any(|w| lower.contains(w)) {
        CrmSyncStatus::Synced
    } else {
        CrmSyncStatus::SyncFailed
    }
}

pub async fn sync_customer(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    request: &CrmSyncRequest,
) -> Result<SpecialistOutcome<CrmSyncStatus>, AgentError> {
    let report = runner.run(&crm_sync_task(request, tools)).await?;
    let status = parse_crm_answer(&report.answer);
    Ok(SpecialistOutcome::from_report(status, report.answer.clone(), &report)
        .with_detail("customer_email", request.customer_email.clone()))
}
