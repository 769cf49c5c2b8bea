//! `concierge task` — Run one specialist task and print its outcome as JSON.

use std::sync::Arc;

use clap::ValueEnum;
use concierge_agent::specialists::{crm, escalation, fraud, inventory, orders, returns};
use concierge_agent::TaskRunner;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskKind {
    Fraud,
    Returns,
    Escalate,
    CrmSync,
    Inventory,
    Order,
}

fn parse<T: DeserializeOwned>(kind: TaskKind, json: &str) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_str(json).map_err(|e| format!("Invalid input for {kind:?} task: {e}").into())
}

fn print<T: Serialize>(outcome: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

pub async fn run(offline: bool, kind: TaskKind, input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(offline)?;
    let json = super::read_input(input)?;

    let provider = concierge_providers::build_from_config(&config)
        .default_provider()
        .ok_or("No default provider configured")?;
    let runner = TaskRunner::from_config(provider, &config);
    let backend = concierge_backend::build_from_config(&config.backend);
    let tools = concierge_tools::default_registry(Arc::clone(&backend));
    info!(task = ?kind, model = runner.model(), backend = ?config.backend.mode, "Running specialist task");

    match kind {
        TaskKind::Fraud => {
            let review = parse(kind, &json)?;
            print(&fraud::analyze_transaction(&runner, &tools, &review).await?)
        }
        TaskKind::Returns => {
            let request = parse(kind, &json)?;
            print(&returns::process_return(&runner, &tools, &request).await?)
        }
        TaskKind::Escalate => {
            let request = parse(kind, &json)?;
            print(&escalation::escalate_issue(&runner, &tools, &request).await?)
        }
        TaskKind::CrmSync => {
            let request = parse(kind, &json)?;
            print(&crm::sync_customer(&runner, &tools, &request).await?)
        }
        TaskKind::Inventory => {
            let request = parse(kind, &json)?;
            print(&inventory::analyze_inventory(&runner, &tools, &request).await?)
        }
        TaskKind::Order => {
            let request = parse(kind, &json)?;
            print(&orders::process_order(&runner, &tools, &request).await?)
        }
    }
}
