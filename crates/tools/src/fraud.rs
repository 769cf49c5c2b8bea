//! Transaction-pattern risk scoring. Local; touches no backend.

use async_trait::async_trait;
use concierge_core::error::ToolError;
use concierge_core::tool::{Tool, ToolResult};
use serde::Serialize;

use crate::args;
use crate::names;

pub struct AnalyzeTransactionPatternTool;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub customer_id: String,
    pub risk_score: u32,
    pub risk_level: &'static str,
    pub indicators: Vec<&'static str>,
    pub recommendation: &'static str,
}

/// Score a transaction.
///
/// +30 above $1,000, +40 for more than 10 transactions in 24h, a further
/// +30 above $5,000. HIGH/BLOCK at 70, MEDIUM/REVIEW at 40, else LOW/APPROVE.
pub fn assess(customer_id: &str, amount: f64, count_24h: i64) -> RiskAssessment {
    let mut score = 0u32;
    let mut indicators = Vec::new();

    if amount > 1000.0 {
        score += 30;
        indicators.push("High transaction amount");
    }
    if count_24h > 10 {
        score += 40;
        indicators.push("Unusual transaction frequency");
    }
    if amount > 5000.0 {
        score += 30;
        indicators.push("Very high transaction amount");
    }

    let (risk_level, recommendation) = match score {
        70.. => ("HIGH", "BLOCK"),
        40..=69 => ("MEDIUM", "REVIEW"),
        _ => ("LOW", "APPROVE"),
    };

    RiskAssessment {
        customer_id: customer_id.to_string(),
        risk_score: score.min(100),
        risk_level,
        indicators,
        recommendation,
    }
}

#[async_trait]
impl Tool for AnalyzeTransactionPatternTool {
    fn name(&self) -> &str {
        names::ANALYZE_TRANSACTION_PATTERN
    }

    fn description(&self) -> &str {
        "Analyze a transaction for fraud. Returns risk_score (0-100), risk_level, indicators and a recommendation (APPROVE, REVIEW or BLOCK)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "customer_id": {
                    "type": "string",
                    "description": "The customer's ID"
                },
                "transaction_amount": {
                    "type": "number",
                    "description": "Current transaction amount in dollars"
                },
                "transaction_count_24h": {
                    "type": "integer",
                    "description": "Number of transactions in the last 24 hours"
                }
            },
            "required": ["customer_id", "transaction_amount", "transaction_count_24h"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let customer_id = args::string(&arguments, "customer_id")?;
        let amount = args::number(&arguments, "transaction_amount")?;
        let count = args::integer(&arguments, "transaction_count_24h")?;

        let assessment = assess(&customer_id, amount, count);
        let value = serde_json::to_value(&assessment)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::json(value))
    }
}
