//! Tool implementations for Concierge agents.
//!
//! One tool per commerce backend operation, plus a local transaction-risk
//! scorer. Every backend tool holds an `Arc<dyn CommerceBackend>`; the
//! registry built by [`default_registry`] is shared read-only by all tasks.

pub mod fraud;
pub mod inventory;
pub mod orders;
pub mod payment;
pub mod support;

mod args;

use std::sync::Arc;

use concierge_core::backend::CommerceBackend;
use concierge_core::tool::ToolRegistry;

pub use fraud::AnalyzeTransactionPatternTool;
pub use inventory::{CheckInventoryTool, ListInventoryTool, UpdateInventoryTool};
pub use orders::{CheckOrderStatusTool, CreateReturnTool};
pub use payment::{ProcessPaymentTool, RefundPaymentTool};
pub use support::CreateSupportCaseTool;

/// Tool names, as the model sees them.
pub mod names {
    pub const CHECK_INVENTORY: &str = "check_inventory";
    pub const LIST_INVENTORY: &str = "list_inventory";
    pub const UPDATE_INVENTORY: &str = "update_inventory";
    pub const PROCESS_PAYMENT: &str = "process_payment";
    pub const REFUND_PAYMENT: &str = "refund_payment";
    pub const CHECK_ORDER_STATUS: &str = "check_order_status";
    pub const CREATE_RETURN: &str = "create_return";
    pub const CREATE_SUPPORT_CASE: &str = "create_support_case";
    pub const ANALYZE_TRANSACTION_PATTERN: &str = "analyze_transaction_pattern";
}

/// Create a registry holding every tool, bound to `backend`.
pub fn default_registry(backend: Arc<dyn CommerceBackend>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CheckInventoryTool::new(backend.clone())));
    registry.register(Arc::new(ListInventoryTool::new(backend.clone())));
    registry.register(Arc::new(UpdateInventoryTool::new(backend.clone())));
    registry.register(Arc::new(ProcessPaymentTool::new(backend.clone())));
    registry.register(Arc::new(RefundPaymentTool::new(backend.clone())));
    registry.register(Arc::new(CheckOrderStatusTool::new(backend.clone())));
    registry.register(Arc::new(CreateReturnTool::new(backend.clone())));
    registry.register(Arc::new(CreateSupportCaseTool::new(backend)));
    registry.register(Arc::new(AnalyzeTransactionPatternTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_backend::InMemoryBackend;

    #[test]
    fn default_registry_has_every_tool() {
        let registry = default_registry(Arc::new(InMemoryBackend::new()));
        assert_eq!(registry.len(), 9);
        for name in [
            names::CHECK_INVENTORY,
            names::LIST_INVENTORY,
            names::UPDATE_INVENTORY,
            names::PROCESS_PAYMENT,
            names::REFUND_PAYMENT,
            names::CHECK_ORDER_STATUS,
            names::CREATE_RETURN,
            names::CREATE_SUPPORT_CASE,
            names::ANALYZE_TRANSACTION_PATTERN,
        ] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn every_schema_is_an_object() {
        let registry = default_registry(Arc::new(InMemoryBackend::new()));
        for def in registry.definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(!def.description.is_empty());
        }
    }
}
