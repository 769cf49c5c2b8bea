//! Returns processing: refund the charge, then put the items back in stock.

use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};

use super::{describe_items, ItemQuantity, SpecialistOutcome};
use crate::runner::TaskRunner;
use crate::task::AgentTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub return_id: i64,
    pub order_id: i64,
    pub customer_id: String,
    #[serde(default)]
    pub items: Vec<ItemQuantity>,
    #[serde(default)]
    pub reason: Option<String>,
    pub charge_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    ReturnCompleted,
    RefundFailed,
}

pub fn persona() -> Persona {
    Persona::new(
        "Returns Processing Specialist",
        "Process returns efficiently and ensure customer satisfaction",
        "You are an expert in handling returns and refunds. You validate return \
         eligibility, process refunds, and update inventory accordingly.",
    )
}

pub fn returns_task(request: &ReturnRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Process this return request:\n\
         - Return ID: {return_id}\n\
         - Order ID: {order_id}\n\
         - Customer: {customer}\n\
         - Items: {items}\n\
         - Reason: {reason}\n\
         - Charge ID: {charge_id}\n\
         \n\
         Steps:\n\
         1. Refund the payment with refund_payment using charge_id={charge_id}\n\
         2. If the refund succeeds, call update_inventory for each returned item \
         with a POSITIVE quantity_change to add it back to stock\n\
         3. If the refund fails, stop and answer 'REFUND_FAILED: <reason>'\n\
         4. If everything succeeds, answer 'RETURN_COMPLETED'",
        return_id = request.return_id,
        order_id = request.order_id,
        customer = request.customer_id,
        items = describe_items(&request.items),
        reason = request.reason.as_deref().unwrap_or("Not specified"),
        charge_id = request.charge_id,
    );

    AgentTask::new(persona(), description)
        .with_tools(tools.subset(&[names::REFUND_PAYMENT, names::UPDATE_INVENTORY]))
        .with_max_iterations(5)
        .with_context("return_id", request.return_id)
        .with_context("order_id", request.order_id)
        .with_context("charge_id", &request.charge_id)
}

/// Any mention of a failure counts as a failed refund.
pub fn parse_returns_answer(answer: &str) -> ReturnStatus {
    if answer.to_uppercase().contains("FAILED") {
        ReturnStatus::RefundFailed
    } else {
        ReturnStatus::ReturnCompleted
    }
}

pub async fn process_return(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    request: &ReturnRequest,
) -> Result<SpecialistOutcome<ReturnStatus>, AgentError> {
    let report = runner.run(&returns_task(request, tools)).await?;
    let status = parse_returns_answer(&report.answer);
    let message = match status {
        ReturnStatus::ReturnCompleted => format!(
            "Return {} processed successfully. Refund issued and inventory updated.",
            request.return_id
        ),
        ReturnStatus::RefundFailed => report.answer.clone(),
    };
    Ok(SpecialistOutcome::from_report(status, message, &report)
        .with_detail("return_id", request.return_id))
}
