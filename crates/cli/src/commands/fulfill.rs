//! `concierge fulfill` — Run the order-fulfillment saga.

use concierge_workflow::{fulfill_order, FulfillmentRequest};
use tracing::info;

pub async fn run(offline: bool, input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(offline)?;
    let request: FulfillmentRequest = serde_json::from_str(&super::read_input(input)?)
        .map_err(|e| format!("Invalid fulfillment input: {e}"))?;

    let backend = concierge_backend::build_from_config(&config.backend);
    info!(order_id = request.order_id, items = request.items.len(), backend = ?config.backend.mode, "Fulfilling order");
    let report = fulfill_order(backend, &request).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
