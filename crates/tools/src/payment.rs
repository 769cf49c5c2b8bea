//! Payment tools — charge and refund.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_core::backend::CommerceBackend;
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde_json::json;
use tracing::info;

use crate::args;
use crate::names;

pub struct ProcessPaymentTool {
    backend: Arc<dyn CommerceBackend>,
}

impl ProcessPaymentTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ProcessPaymentTool {
    fn name(&self) -> &str {
        names::PROCESS_PAYMENT
    }

    fn description(&self) -> &str {
        "Charge a customer. Returns status 'success' with a charge_id, or status 'failed' with the decline reason."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {
                    "type": "number",
                    "description": "The amount to charge in dollars"
                },
                "customer_id": {
                    "type": "string",
                    "description": "The customer's payment-provider ID"
                }
            },
            "required": ["amount", "customer_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let amount = args::number(&arguments, "amount")?;
        let customer_id = args::string(&arguments, "customer_id")?;
        match self.backend.charge_payment(amount, &customer_id).await {
            Ok(charge) => {
                info!(customer_id = %customer_id, amount, charge_id = %charge.charge_id, "Payment charged");
                Ok(ToolResult::json(json!({
                    "status": "success",
                    "charge_id": charge.charge_id,
                })))
            }
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}

pub struct RefundPaymentTool {
    backend: Arc<dyn CommerceBackend>,
}

impl RefundPaymentTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for RefundPaymentTool {
    fn name(&self) -> &str {
        names::REFUND_PAYMENT
    }

    fn description(&self) -> &str {
        "Refund a previous charge in full. Returns status 'success' with a refund_id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "charge_id": {
                    "type": "string",
                    "description": "The charge ID to refund"
                }
            },
            "required": ["charge_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let charge_id = args::string(&arguments, "charge_id")?;
        match self.backend.refund_payment(&charge_id).await {
            Ok(refund) => Ok(ToolResult::json(json!({
                "status": "success",
                "refund_id": refund.refund_id,
            }))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}
