//! Specialist tasks.
//!
//! Each specialist is a persona plus a fixed tool subset, a task builder
//! that renders the request into a prompt, and a parser that reduces the
//! model's free-text answer to a status. The prompts ask for an uppercase
//! marker; the parsers look for it by keyword, and anything else falls
//! through to the specialist's default.

pub mod classifier;
pub mod crm;
pub mod escalation;
pub mod fraud;
pub mod inventory;
pub mod orders;
pub mod returns;

use serde::{Deserialize, Serialize};

use crate::runner::TaskReport;

pub use classifier::classifier_task;
pub use crm::{CrmSyncRequest, CrmSyncStatus};
pub use escalation::{EscalationRequest, EscalationStatus};
pub use fraud::{FraudStatus, TransactionReview};
pub use inventory::{InventoryAnalysisRequest, InventoryStatus};
pub use orders::{OrderProcessingRequest, OrderProcessingStatus};
pub use returns::{ReturnRequest, ReturnStatus};

/// A product and a unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub product_id: i64,
    pub quantity: i64,
}

/// Renders `"Product 1: 2 units, Product 5: 1 units"`.
pub(crate) fn describe_items(items: &[ItemQuantity]) -> String {
    items
        .iter()
        .map(|item| format!("Product {}: {} units", item.product_id, item.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// What a specialist run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SpecialistOutcome<S> {
    pub status: S,
    pub message: String,
    /// The model's final answer, verbatim.
    pub answer: String,
    pub iterations: u32,
    pub tool_calls_made: usize,
    /// Request fields echoed back (ids, severity, recommendations).
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl<S> SpecialistOutcome<S> {
    pub(crate) fn from_report(status: S, message: impl Into<String>, report: &TaskReport) -> Self {
        Self {
            status,
            message: message.into(),
            answer: report.answer.clone(),
            iterations: report.iterations,
            tool_calls_made: report.tool_calls_made,
            details: serde_json::Map::new(),
        }
    }

    pub(crate) fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}
