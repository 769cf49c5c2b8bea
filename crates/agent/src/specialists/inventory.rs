//! Inventory analysis: compare stock with a reorder threshold.

use concierge_core::error::AgentError;
use concierge_core::persona::Persona;
use concierge_core::tool::ToolRegistry;
use concierge_tools::names;
use serde::{Deserialize, Serialize};

use super::SpecialistOutcome;
use crate::runner::TaskRunner;
use crate::task::AgentTask;

pub const DEFAULT_REORDER_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAnalysisRequest {
    pub product_id: i64,
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_threshold() -> i64 {
    DEFAULT_REORDER_THRESHOLD
}

impl InventoryAnalysisRequest {
    pub fn new(product_id: i64) -> Self {
        Self {
            product_id,
            threshold: DEFAULT_REORDER_THRESHOLD,
        }
    }

    /// Twice the threshold.
    pub fn recommended_quantity(&self) -> i64 {
        self.threshold * 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    ReorderRecommended,
    StockAdequate,
}

pub fn persona() -> Persona {
    Persona::new(
        "Inventory Intelligence Analyst",
        "Monitor stock levels and optimize inventory",
        "You are an expert in inventory management and demand forecasting. You analyze \
         stock levels and make data-driven reorder recommendations.",
    )
}

pub fn inventory_task(request: &InventoryAnalysisRequest, tools: &ToolRegistry) -> AgentTask {
    let description = format!(
        "Analyze inventory for product {id} with a reorder threshold of {threshold} units.\n\
         \n\
         Steps:\n\
         1. Use check_inventory to get the current stock level for product_id={id}\n\
         2. If stock is below {threshold}, recommend reordering {quantity} units\n\
         3. Report the current stock, the threshold and whether a reorder is needed",
        id = request.product_id,
        threshold = request.threshold,
        quantity = request.recommended_quantity(),
    );

    AgentTask::new(persona(), description)
        .with_tools(tools.subset(&[names::CHECK_INVENTORY, names::UPDATE_INVENTORY]))
        .with_max_iterations(3)
        .with_context("product_id", request.product_id)
        .with_context("threshold", request.threshold)
}

/// A reorder is recommended when the answer mentions "reorder" together with
/// "needed" or "recommend".
pub fn parse_inventory_answer(answer: &str) -> InventoryStatus {
    let lower = answer.to_lowercase();
    if lower.contains("reorder") && (lower.contains("needed") || lower.contains("recommend")) {
        InventoryStatus::ReorderRecommended
    } else {
        InventoryStatus::StockAdequate
    }
}

pub async fn analyze_inventory(
    runner: &TaskRunner,
    tools: &ToolRegistry,
    request: &InventoryAnalysisRequest,
) -> Result<SpecialistOutcome<InventoryStatus>, AgentError> {
    let report = runner.run(&inventory_task(request, tools)).await?;
    let status = parse_inventory_answer(&report.answer);
    let mut outcome = SpecialistOutcome::from_report(status, report.answer.clone(), &report)
        .with_detail("product_id", request.product_id)
        .with_detail("threshold", request.threshold)
        .with_detail("needs_reorder", status == InventoryStatus::ReorderRecommended);
    if status == InventoryStatus::ReorderRecommended {
        outcome = outcome.with_detail("recommended_quantity", request.recommended_quantity());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use concierge_backend::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn threshold_defaults_when_missing() {
        let req: InventoryAnalysisRequest = serde_json::from_value(json!({"product_id": 9})).unwrap();
        assert_eq!(req.threshold, 10);
        assert_eq!(req.recommended_quantity(), 20);
    }

    #[test]
    fn parse_requires_reorder_and_need() {
        assert_eq!(
            parse_inventory_answer("Stock is 4. Reorder needed: 20 units."),
            InventoryStatus::ReorderRecommended
        );
        assert_eq!(
            parse_inventory_answer("Stock is 40. No reorder at this time."),
            InventoryStatus::StockAdequate
        );
    }

    #[tokio::test]
    async fn low_stock_yields_recommendation() {
        let tools = concierge_tools::default_registry(Arc::new(InMemoryBackend::with_demo_catalogue()));
        let provider = SequentialMockProvider::tool_then_answer(
            vec![make_tool_call(names::CHECK_INVENTORY, json!({"product_id": 2}))],
            "",
            "Current stock 8 is below 10. Reorder recommended: 20 units.",
        );
        let runner = TaskRunner::new(Arc::new(provider), "mock-model");

        let outcome = analyze_inventory(&runner, &tools, &InventoryAnalysisRequest::new(2))
            .await
            .unwrap();
        assert_eq!(outcome.status, InventoryStatus::ReorderRecommended);
        assert_eq!(outcome.details["recommended_quantity"], 20);
        assert_eq!(outcome.details["needs_reorder"], true);
    }
}
