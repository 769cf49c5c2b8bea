//! Fraud review of a single transaction.

use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};

use super::SpecialistOutcome;
use crate::runner::TaskRunner;
use crate::task::AgentTask;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReview {
    pub customer_id: String,
    pub transaction_amount: f64,
    #[serde(default)]
    pub transaction_count_24h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudStatus {
    Approved,
    FlaggedForReview,
    Blocked,
}

impl FraudStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::Approved => "Transaction approved",
            Self::FlaggedForReview => "Transaction flagged for manual review",
            Self::Blocked => "Transaction blocked due to high fraud risk",
        }
    }
}

pub fn persona() -> Persona {
    Persona::new(
        "Fraud Detection Specialist",
        "Identify and prevent fraudulent transactions",
        "You are an expert in fraud detection and risk analysis. You analyze transaction \
         patterns and customer behavior to identify suspicious activity.",
    )
}

pub fn fraud_task(review: &TransactionReview, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Analyze this transaction for fraud:\n\
         - Customer ID: {customer}\n\
         - Amount: ${amount}\n\
         - Recent transactions (24h): {count}\n\
         \n\
         Steps:\n\
         1. Use analyze_transaction_pattern with the transaction details\n\
         2. Based on the risk_score and indicators, decide on a recommendation\n\
         3. Answer with one of: APPROVED, FLAGGED_FOR_REVIEW, BLOCKED",
        customer = review.customer_id,
        amount = review.transaction_amount,
        count = review.transaction_count_24h,
    );

    AgentTask::new(persona(), description)
        .with_tools(tools.subset(&[names::ANALYZE_TRANSACTION_PATTERN]))
        .with_max_iterations(3)
        .with_context("customer_id", &review.customer_id)
        .with_context("transaction_amount", review.transaction_amount)
        .with_context("transaction_count_24h", review.transaction_count_24h)
}

/// BLOCKED wins over REVIEW/FLAGGED, which win over approval.
pub fn parse_fraud_answer(answer: &str) -> FraudStatus {
    let upper = answer.to_uppercase();
    if upper.contains("BLOCKED") {
        FraudStatus::Blocked
    } else if upper.contains("REVIEW") || upper.contains("FLAGGED") {
        FraudStatus::FlaggedForReview
    } else {
        FraudStatus::Approved
    }
}

pub async fn analyze_transaction(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    review: &TransactionReview,
) -> Result<SpecialistOutcome<FraudStatus>, AgentError> {
    let report = runner.run(&fraud_task(review, tools)).await?;
    let status = parse_fraud_answer(&report.answer);
    Ok(SpecialistOutcome::from_report(status, status.message(), &report)
        .with_detail("customer_id", review.customer_id.clone()))
}
