//! CommerceBackend trait — the external services the dispatch layer and
//! the tools consume.
//!
//! Orders, inventory, returns, payments and support cases are owned by other
//! services; this crate only fixes the operations and record shapes.
//! Implementations: HTTP client against the service gateway, in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::BackendError;

/// A catalogue record from the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub stock: i64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_location: Option<String>,
    #[serde(default = "default_reorder_threshold")]
    pub reorder_threshold: i64,
}

fn default_reorder_threshold() -> i64 {
    10
}

impl InventoryItem {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// Payload for `create-order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: i64,
    pub total_amount: f64,
    pub items: Vec<OrderLine>,
}

/// An order as reported by the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload for `create-return`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReturn {
    pub order_id: i64,
    pub reason: String,
    pub refund_amount: f64,
}

/// A return as reported by the returns service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub id: i64,
    pub order_id: i64,
    pub reason: String,
    pub status: String,
    #[serde(default)]
    pub refund_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub charge_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub refund_id: String,
}

/// Support-case priority as understood by the CRM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl CasePriority {
    /// Lenient parse; anything unrecognised maps to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

/// Payload for `create-support-case`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSupportCase {
    pub customer_email: String,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: CasePriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportCase {
    pub case_id: String,
}

/// The commerce services consumed by the core.
///
/// Every call may block on the network and must be bounded by a timeout in
/// the implementation. No call is retried by callers.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// A short name for logs (e.g., "http", "in_memory").
    fn name(&self) -> &str;

    async fn get_inventory(&self, product_id: i64) -> Result<InventoryItem, BackendError>;

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, BackendError>;

    /// Apply a signed stock delta and return the updated record.
    async fn adjust_inventory(&self, product_id: i64, delta: i64) -> Result<InventoryItem, BackendError>;

    async fn charge_payment(&self, amount: f64, customer_id: &str) -> Result<Charge, BackendError>;

    async fn refund_payment(&self, charge_id: &str) -> Result<Refund, BackendError>;

    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, BackendError>;

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord, BackendError>;

    async fn create_return(&self, request: NewReturn) -> Result<ReturnRecord, BackendError>;

    async fn create_support_case(&self, case: NewSupportCase) -> Result<SupportCase, BackendError>;
}
