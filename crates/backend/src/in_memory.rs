//! In-memory backend — a seeded catalogue for tests and offline demos.
//!
//! Recent calls are recorded so tests can assert which backend operations a
//! conversation triggered (and, just as often, that none were).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use concierge_core::backend::*;
use concierge_core::error::BackendError;
use uuid::Uuid;

/// Calls kept in the log; older ones are dropped first.
pub const CALL_LOG_CAPACITY: usize = 1_000;

/// A recorded backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    GetInventory(i64),
    ListInventory,
    AdjustInventory { product_id: i64, delta: i64 },
    ChargePayment { amount: f64, customer_id: String },
    RefundPayment(String),
    CreateOrder(NewOrder),
    GetOrder(i64),
    CreateReturn(NewReturn),
    CreateSupportCase(NewSupportCase),
}

impl BackendCall {
    /// Operation name, as used by [`InMemoryBackend::fail_on`].
    pub fn operation(&self) -> &'static str {
        match self {
            Self::GetInventory(_) => "get_inventory",
            Self::ListInventory => "list_inventory",
            Self::AdjustInventory { .. } => "adjust_inventory",
            Self::ChargePayment { .. } => "charge_payment",
            Self::RefundPayment(_) => "refund_payment",
            Self::CreateOrder(_) => "create_order",
            Self::GetOrder(_) => "get_order",
            Self::CreateReturn(_) => "create_return",
            Self::CreateSupportCase(_) => "create_support_case",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    inventory: Vec<InventoryItem>,
    orders: BTreeMap<i64, OrderRecord>,
    returns: Vec<ReturnRecord>,
    /// charge id → (amount, refunded)
    charges: HashMap<String, (f64, bool)>,
    cases: Vec<NewSupportCase>,
    calls: VecDeque<BackendCall>,
    failures: HashMap<&'static str, BackendError>,
    next_order_id: i64,
}

/// An in-process [`CommerceBackend`].
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_order_id: 2001,
                ..State::default()
            }),
        }
    }

    /// A small electronics catalogue and a handful of historical orders.
    pub fn with_demo_catalogue() -> Self {
        let inventory = vec![
            product(1, "Gaming Laptop RTX 4060", "GLAP-4060", 15, 1299.99, "Laptops", 5),
            product(2, "Dell Latitude 15", "DELL-LAT15", 8, 899.99, "Laptops", 3),
            product(3, "Lenovo ThinkPad X1", "LNVO-X1", 0, 1499.99, "Laptops", 3),
            product(4, "ASUS ROG Strix", "ASUS-ROG", 6, 1899.99, "Laptops", 3),
            product(5, "RGB Mechanical Keyboard", "KB-RGB-01", 50, 129.99, "Keyboards", 15),
            product(6, "Wireless Gaming Keyboard", "KB-WL-G", 30, 89.99, "Keyboards", 10),
            product(7, "Wireless Gaming Mouse", "MOUSE-WL-G", 40, 69.99, "Mice", 12),
            product(8, "Ergonomic Vertical Mouse", "MOUSE-VERT", 18, 49.99, "Mice", 8),
            product(9, "27\" 4K Monitor", "MON-27-4K", 10, 399.99, "Monitors", 4),
            product(10, "24\" Gaming Monitor 144Hz", "MON-24-144", 15, 299.99, "Monitors", 5),
            product(11, "USB-C Hub 7-in-1", "ACC-HUB-7", 45, 39.99, "Accessories", 15),
        ];
        let orders = vec![
            order(1001, "DELIVERED", 1429.98),
            order(1002, "PROCESSING", 899.99),
            order(1003, "SHIPPED", 289.97),
            order(1005, "PENDING", 399.98),
            order(1009, "CANCELLED", 1299.99),
        ];
        Self::new().with_inventory(inventory).with_orders(orders)
    }

    pub fn with_inventory(mut self, items: Vec<InventoryItem>) -> Self {
        self.state_mut().inventory = items;
        self
    }

    pub fn with_orders(mut self, orders: Vec<OrderRecord>) -> Self {
        let state = self.state_mut();
        for order in orders {
            state.next_order_id = state.next_order_id.max(order.id + 1);
            state.orders.insert(order.id, order);
        }
        self
    }

    /// Make every subsequent call of `operation` fail with `error`.
    pub fn fail_on(&self, operation: &'static str, error: BackendError) {
        self.lock().failures.insert(operation, error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// The most recent calls, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.iter().cloned().collect()
    }

    /// Calls of one operation.
    pub fn calls_of(&self, operation: &str) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .cloned()
            .collect()
    }

    pub fn stock_of(&self, product_id: i64) -> Option<i64> {
        self.lock()
            .inventory
            .iter()
            .find(|i| i.id == product_id)
            .map(|i| i.stock)
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.lock().orders.values().cloned().collect()
    }

    pub fn support_cases(&self) -> Vec<NewSupportCase> {
        self.lock().cases.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and return the injected failure, if any.
    fn begin(&self, call: BackendCall) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        let operation = call.operation();
        if state.calls.len() == CALL_LOG_CAPACITY {
            state.calls.pop_front();
        }
        state.calls.push_back(call);
        if let Some(err) = state.failures.get(operation).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn product(
    id: i64,
    name: &str,
    sku: &str,
    stock: i64,
    price: f64,
    category: &str,
    reorder_threshold: i64,
) -> InventoryItem {
    InventoryItem {
        id,
        name: name.into(),
        sku: sku.into(),
        stock,
        price,
        category: Some(category.into()),
        warehouse_location: Some("WH-1".into()),
        reorder_threshold,
    }
}

fn order(id: i64, status: &str, total_amount: f64) -> OrderRecord {
    OrderRecord {
        id,
        status: status.into(),
        total_amount,
        created_at: Some(Utc::now().to_rfc3339()),
    }
}

#[async_trait]
impl CommerceBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_inventory(&self, product_id: i64) -> Result<InventoryItem, BackendError> {
        let state = self.begin(BackendCall::GetInventory(product_id))?;
        state
            .inventory
            .iter()
            .find(|i| i.id == product_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("product", product_id))
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, BackendError> {
        let state = self.begin(BackendCall::ListInventory)?;
        Ok(state.inventory.clone())
    }

    async fn adjust_inventory(&self, product_id: i64, delta: i64) -> Result<InventoryItem, BackendError> {
        let mut state = self.begin(BackendCall::AdjustInventory { product_id, delta })?;
        let item = state
            .inventory
            .iter_mut()
            .find(|i| i.id == product_id)
            .ok_or_else(|| BackendError::not_found("product", product_id))?;
        let stock = item.stock + delta;
        if stock < 0 {
            return Err(BackendError::Validation(format!(
                "insufficient stock for product {product_id}: have {}, need {}",
                item.stock, -delta
            )));
        }
        item.stock = stock;
        Ok(item.clone())
    }

    async fn charge_payment(&self, amount: f64, customer_id: &str) -> Result<Charge, BackendError> {
        let mut state = self.begin(BackendCall::ChargePayment {
            amount,
            customer_id: customer_id.to_string(),
        })?;
        if amount <= 0.0 {
            return Err(BackendError::Validation(format!("invalid charge amount {amount}")));
        }
        let charge_id = format!("ch_{}", Uuid::new_v4().simple());
        state.charges.insert(charge_id.clone(), (amount, false));
        Ok(Charge { charge_id })
    }

    async fn refund_payment(&self, charge_id: &str) -> Result<Refund, BackendError> {
        let mut state = self.begin(BackendCall::RefundPayment(charge_id.to_string()))?;
        let (_, refunded) = state
            .charges
            .get_mut(charge_id)
            .ok_or_else(|| BackendError::not_found("charge", charge_id))?;
        if *refunded {
            return Err(BackendError::Validation(format!("charge {charge_id} already refunded")));
        }
        *refunded = true;
        Ok(Refund {
            refund_id: format!("re_{}", Uuid::new_v4().simple()),
        })
    }

    async fn create_order(&self, new_order: NewOrder) -> Result<OrderRecord, BackendError> {
        let mut state = self.begin(BackendCall::CreateOrder(new_order.clone()))?;
        if new_order.items.is_empty() {
            return Err(BackendError::Validation("order has no items".into()));
        }
        let id = state.next_order_id;
        state.next_order_id += 1;
        let record = OrderRecord {
            id,
            status: "PENDING".into(),
            total_amount: new_order.total_amount,
            created_at: Some(Utc::now().to_rfc3339()),
        };
        state.orders.insert(id, record.clone());
        Ok(record)
    }

    async fn get_order(&self, order_id: i64) -> Result<OrderRecord, BackendError> {
        let state = self.begin(BackendCall::GetOrder(order_id))?;
        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("order", order_id))
    }

    async fn create_return(&self, request: NewReturn) -> Result<ReturnRecord, BackendError> {
        let mut state = self.begin(BackendCall::CreateReturn(request.clone()))?;
        if !state.orders.contains_key(&request.order_id) {
            return Err(BackendError::not_found("order", request.order_id));
        }
        let record = ReturnRecord {
            id: state.returns.len() as i64 + 1,
            order_id: request.order_id,
            reason: request.reason,
            status: "PENDING".into(),
            refund_amount: request.refund_amount,
        };
        state.returns.push(record.clone());
        Ok(record)
    }

    async fn create_support_case(&self, case: NewSupportCase) -> Result<SupportCase, BackendError> {
        let mut state = self.begin(BackendCall::CreateSupportCase(case.clone()))?;
        state.cases.push(case);
        Ok(SupportCase {
            case_id: format!("CASE-{:05}", state.cases.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_log_drops_oldest_beyond_capacity() {
        let backend = InMemoryBackend::with_demo_catalogue();
        backend.list_inventory().await.unwrap();
        for _ in 0..CALL_LOG_CAPACITY {
            backend.get_inventory(1).await.unwrap();
        }
        let calls = backend.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert!(backend.calls_of("list_inventory").is_empty());
        assert_eq!(calls[0], BackendCall::GetInventory(1));
    }

    #[tokio::test]
    async fn adjust_inventory_rejects_negative_stock() {
        let backend = InMemoryBackend::with_demo_catalogue();
        let updated = backend.adjust_inventory(2, -3).await.unwrap();
        assert_eq!(updated.stock, 5);

        let err = backend.adjust_inventory(2, -6).await.unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
        assert_eq!(backend.stock_of(2), Some(5));
    }

    #[tokio::test]
    async fn created_orders_are_retrievable() {
        let backend = InMemoryBackend::with_demo_catalogue();
        let created = backend
            .create_order(NewOrder {
                user_id: 1,
                total_amount: 69.99,
                items: vec![OrderLine { product_id: 7, quantity: 1, price: 69.99 }],
            })
            .await
            .unwrap();
        assert!(created.id > 1009);
        assert_eq!(backend.get_order(created.id).await.unwrap().status, "PENDING");
    }

    #[tokio::test]
    async fn refund_twice_is_rejected() {
        let backend = InMemoryBackend::new();
        let charge = backend.charge_payment(25.0, "cus_1").await.unwrap();
        backend.refund_payment(&charge.charge_id).await.unwrap();
        assert!(matches!(
            backend.refund_payment(&charge.charge_id).await,
            Err(BackendError::Validation(_))
        ));
        assert!(backend.refund_payment("ch_unknown").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_are_recorded_calls() {
        let backend = InMemoryBackend::with_demo_catalogue();
        backend.fail_on("list_inventory", BackendError::Unavailable("down".into()));

        assert!(backend.list_inventory().await.is_err());
        assert_eq!(backend.calls(), vec![BackendCall::ListInventory]);

        backend.clear_failures();
        assert!(backend.list_inventory().await.is_ok());
        assert_eq!(backend.calls_of("list_inventory").len(), 2);
    }

    #[tokio::test]
    async fn return_requires_known_order() {
        let backend = InMemoryBackend::with_demo_catalogue();
        let record = backend
            .create_return(NewReturn {
                order_id: 1001,
                reason: "Customer request via chat".into(),
                refund_amount: 0.0,
            })
            .await
            .unwrap();
        assert_eq!(record.status, "PENDING");

        let missing = NewReturn {
            order_id: 4242,
            reason: "x".into(),
            refund_amount: 0.0,
        };
        assert!(backend.create_return(missing).await.unwrap_err().is_not_found());
    }
}
