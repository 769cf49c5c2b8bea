//! Order processing as a sequence of tasks.
//!
//! Reservation and payment run as two separate tasks. A failed payment
//! after a successful reservation triggers a third, explicit task that
//! releases the reserved stock; the loop itself never compensates.
//! `concierge_workflow` offers the deterministic saga equivalent.

use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{describe_items, ItemQuantity, SpecialistOutcome};
use crate::runner::TaskRunner;
use crate::task::AgentTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProcessingRequest {
    pub order_id: i64,
    pub customer_id: String,
    pub items: Vec<ItemQuantity>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderProcessingStatus {
    OrderConfirmed,
    OutOfStock,
    PaymentFailed,
}

pub fn persona() -> Persona {
    Persona::new(
        "Order Processing Specialist",
        "Validate orders, check inventory, and process payments efficiently",
        "You are an expert in order fulfillment. You ensure that every order is valid, \
         items are in stock, and payments are secured before confirming an order.",
    )
}

fn order_tools(tools: &ToolRegistry) -> ToolRegistry {
    tools.subset(&[
        names::CHECK_INVENTORY,
        names::UPDATE_INVENTORY,
        names::PROCESS_PAYMENT,
    ])
}

fn base_task(request: &OrderProcessingRequest, tools: &ToolRegistry, description: String) -> AgentTask {
    AgentTask::new(persona(), description)
        .with_tools(order_tools(tools))
        .with_max_iterations(5)
        .with_context("order_id", request.order_id)
        .with_context("customer_id", &request.customer_id)
        .with_context("total_amount", request.total_amount)
}

pub fn reservation_task(request: &OrderProcessingRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Check inventory for these items: {items}.\n\
         \n\
         For EACH product:\n\
         1. Use check_inventory to verify stock availability\n\
         2. If ANY item is out of stock, immediately answer 'OUT_OF_STOCK: <product_id>'\n\
         3. If ALL items are in stock, reserve them with update_inventory using a \
         NEGATIVE quantity_change\n\
         \n\
         Answer 'STOCK_RESERVED' once every item is reserved.",
        items = describe_items(&request.items),
    );
    base_task(request, tools, description)
}

pub fn payment_task(request: &OrderProcessingRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Process payment for order total of ${total}.\n\
         \n\
         1. Use process_payment with amount={total} and customer_id={customer}\n\
         2. If payment succeeds, answer 'PAYMENT_SUCCESS'\n\
         3. If payment fails, answer 'PAYMENT_FAILED: <reason>'",
        total = request.total_amount,
        customer = request.customer_id,
    );
    base_task(request, tools, description)
}

pub fn release_task(request: &OrderProcessingRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Payment failed. Release the reserved inventory for these items by calling \
         update_inventory with a POSITIVE quantity_change for each: {items}.\n\
         Answer 'STOCK_RELEASED' when done.",
        items = describe_items(&request.items),
    );
    base_task(request, tools, description)
}

pub fn is_out_of_stock(answer: &str) -> bool {
    answer.to_uppercase().contains("OUT_OF_STOCK")
}

pub fn is_payment_failure(answer: &str) -> bool {
    answer.to_uppercase().contains("PAYMENT_FAILED") || answer.to_lowercase().contains("failed")
}

/// Reserve, charge, and release the reservation if the charge fails.
pub async fn process_order(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    request: &OrderProcessingRequest,
) -> Result<SpecialistOutcome<OrderProcessingStatus>, AgentError> {
    let reservation = runner.run(&reservation_task(request, tools)).await?;
    if is_out_of_stock(&reservation.answer) {
        info!(order_id = request.order_id, "Order rejected: out of stock");
        return Ok(SpecialistOutcome::from_report(
            OrderProcessingStatus::OutOfStock,
            reservation.answer.clone(),
            &reservation,
        )
        .with_detail("order_id", request.order_id));
    }

    let payment = runner.run(&payment_task(request, tools)).await?;
    if is_payment_failure(&payment.answer) {
        warn!(order_id = request.order_id, "Payment failed, releasing reservation");
        // The outcome stays PAYMENT_FAILED whether or not the release succeeds.
        if let Err(e) = runner.run(&release_task(request, tools)).await {
            warn!(order_id = request.order_id, error = %e, "Reservation release task failed");
        }
        return Ok(SpecialistOutcome::from_report(
            OrderProcessingStatus::PaymentFailed,
            payment.answer.clone(),
            &payment,
        )
        .with_detail("order_id", request.order_id));
    }

    info!(order_id = request.order_id, "Order confirmed");
    Ok(SpecialistOutcome::from_report(
        OrderProcessingStatus::OrderConfirmed,
        format!(
            "Order {} confirmed successfully. Payment processed and inventory reserved.",
            request.order_id
        ),
        &payment,
    )
    .with_detail("order_id", request.order_id)
    .with_detail("payment_details", payment.answer.clone()))
}
