//! CRM support-case tool.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_core::backend::{CasePriority, CommerceBackend, NewSupportCase};
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde_json::json;

use crate::args;
use crate::names;

pub struct CreateSupportCaseTool {
    backend: Arc<dyn CommerceBackend>,
}

impl CreateSupportCaseTool {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CreateSupportCaseTool {
    fn name(&self) -> &str {
        names::CREATE_SUPPORT_CASE
    }

    fn description(&self) -> &str {
        "Create a customer support case in the CRM. Returns status 'success' with the case_id."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "customer_email": {
                    "type": "string",
                    "description": "Customer's email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Case subject"
                },
                "description": {
                    "type": "string",
                    "description": "Detailed description of the issue"
                },
                "priority": {
                    "type": "string",
                    "enum": ["Low", "Medium", "High", "Critical"],
                    "description": "Case priority (default: Medium)",
                    "default": "Medium"
                }
            },
            "required": ["customer_email", "subject", "description"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let case = NewSupportCase {
            customer_email: args::string(&arguments, "customer_email")?,
            subject: args::string(&arguments, "subject")?,
            description: args::string(&arguments, "description")?,
            priority: arguments["priority"]
                .as_str()
                .map(CasePriority::parse)
                .unwrap_or_default(),
        };
        match self.backend.create_support_case(case).await {
            Ok(created) => Ok(ToolResult::json(json!({
                "status": "success",
                "case_id": created.case_id,
            }))),
            Err(e) => args::backend_failure(self.name(), e),
        }
    }
}
