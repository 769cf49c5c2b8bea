//! Order tools — status lookup and return creation.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_core::backend::{CommerceBackend, NewReturn};
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde_json::json;

use crate::args;
use crate::names;

pub struct CheckOrderStatusTool {
    backend: Arc<dyn CommerceBackend>,
}

impl CheckOrderStatusTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CheckOrderStatusTool {
    fn name(&self) -> &str {
        names::CHECK_ORDER_STATUS
    }

    fn description(&self) -> &str {
        "Look up an order by ID (e.g. 1001 or '#1001') and return its status, total and creation date."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order number, with or without a leading '#'"
                }
            },
            "required": ["order_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let order_id = args::integer(&arguments, "order_id")?;
        match self.backend.get_order(order_id).await {
            Ok(order) => Ok(ToolResult::json(json!(order))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}

pub struct CreateReturnTool {
    backend: Arc<dyn CommerceBackend>,
}

impl CreateReturnTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CreateReturnTool {
    fn name(&self) -> &str {
        names::CREATE_RETURN
    }

    fn description(&self) -> &str {
        "Open a return for an order. The refund amount defaults to 0 and is settled by the returns service."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order number, with or without a leading '#'"
                },
                "reason": {
                    "type": "string",
                    "description": "Why the customer is returning the order"
                },
                "amount": {
                    "type": "number",
                    "description": "Refund amount in dollars (optional)"
                }
            },
            "required": ["order_id", "reason"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let order_id = args::integer(&arguments, "order_id")?;
        let reason = args::string(&arguments, "reason")?;
        let refund_amount = args::number(&arguments, "amount").unwrap_or(0.0);

        let request = NewReturn {
            order_id,
            reason,
            refund_amount,
        };
        match self.backend.create_return(request).await {
            Ok(record) => Ok(ToolResult::json(json!(record))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_backend::InMemoryBackend;

    #[tokio::test]
    async fn order_id_accepts_hash_prefix() {
        let tool = CheckOrderStatusTool::new(Arc::new(InMemoryBackend::with_demo_catalogue()));
        let result = tool.execute(json!({ "order_id": "#1003" })).await.unwrap();
        assert_eq!(result.data.unwrap()["status"], "SHIPPED");
    }

    #[tokio::test]
    async fn create_return_defaults_amount() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let tool = CreateReturnTool::new(backend.clone());
        let result = tool
            .execute(json!({ "order_id": 1001, "reason": "defective" }))
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["order_id"], 1001);
        assert_eq!(data["refund_amount"], 0.0);
    }
}
