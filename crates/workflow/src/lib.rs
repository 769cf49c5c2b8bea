//! Saga orchestration — ordered steps with explicit compensation.
//!
//! A [`Saga`] runs its steps in order. When a step fails, every step that
//! already completed is compensated in reverse order, and the run stops.
//! Compensation failures are logged and reported but never retried.
//!
//! [`fulfill_order`] is the built-in saga: one stock reservation per item
//! followed by a payment charge.

use async_trait::async_trait;
use concierge_core::backend::CommerceBackend;
use concierge_core::error::BackendError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a step failed.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("product {product_id} has {available} units, {requested} requested")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Serialize for StepError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Values steps hand to each other (and to their own compensation).
#[derive(Debug, Default, Clone)]
pub struct SagaContext {
    values: HashMap<String, String>,
}

impl SagaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// One forward action and its undo.
#[async_trait]
pub trait SagaStep: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), StepError>;

    /// Undo a successful `execute`. Only called for steps that completed.
    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError>;
}

#[derive(Debug, Serialize)]
pub struct FailedStep {
    pub step: String,
    pub error: StepError,
}

/// What a saga run did.
#[derive(Debug, Default, Serialize)]
pub struct SagaOutcome {
    /// Steps whose `execute` succeeded, in execution order.
    pub completed: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedStep>,

    /// Steps whose `compensate` succeeded, in compensation order.
    pub compensated: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compensation_failures: Vec<FailedStep>,
}

impl SagaOutcome {
    pub fn succeeded(&self) -> bool {
        self.failed.is_none()
    }
}

/// An ordered list of steps.
pub struct Saga {
    name: String,
    steps: Vec<Box<dyn SagaStep>>,
}

impl Saga {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl SagaStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, ctx: &mut SagaContext) -> SagaOutcome {
        let mut outcome = SagaOutcome::default();

        for (index, step) in self.steps.iter().enumerate() {
            debug!(saga = %self.name, step = step.name(), "Executing step");
            match step.execute(ctx).await {
                Ok(()) => outcome.completed.push(step.name().to_string()),
                Err(error) => {
                    warn!(saga = %self.name, step = step.name(), error = %error, "Step failed, compensating");
                    outcome.failed = Some(FailedStep {
                        step: step.name().to_string(),
                        error,
                    });
                    self.compensate(&self.steps[..index], ctx, &mut outcome).await;
                    return outcome;
                }
            }
        }

        info!(saga = %self.name, steps = outcome.completed.len(), "Saga completed");
        outcome
    }

    async fn compensate(&self, done: &[Box<dyn SagaStep>], ctx: &SagaContext, outcome: &mut SagaOutcome) {
        for step in done.iter().rev() {
            match step.compensate(ctx).await {
                Ok(()) => {
                    debug!(saga = %self.name, step = step.name(), "Step compensated");
                    outcome.compensated.push(step.name().to_string());
                }
                Err(error) => {
                    warn!(saga = %self.name, step = step.name(), error = %error, "Compensation failed");
                    outcome.compensation_failures.push(FailedStep {
                        step: step.name().to_string(),
                        error,
                    });
                }
            }
        }
    }
}

// ── Order fulfillment ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub order_id: i64,
    pub customer_id: String,
    pub items: Vec<FulfillmentItem>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    OrderConfirmed,
    OutOfStock,
    PaymentFailed,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct FulfillmentReport {
    pub status: FulfillmentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_id: Option<String>,
    pub saga: SagaOutcome,
}

const PAYMENT_STEP: &str = "charge-payment";
const CHARGE_ID: &str = "charge_id";

/// Takes `quantity` units out of stock; compensation puts them back.
pub struct ReserveStock {
    backend: Arc<dyn CommerceBackend>,
    name: String,
    product_id: i64,
    quantity: i64,
}

impl ReserveStock {
    pub fn new(backend: Arc<dyn CommerceBackend>, product_id: i64, quantity: i64) -> Self {
        Self {
            backend,
            name: format!("reserve-{product_id}"),
            product_id,
            quantity,
        }
    }
}

#[async_trait]
impl SagaStep for ReserveStock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut SagaContext) -> Result<(), StepError> {
        if self.quantity <= 0 {
            return Err(StepError::Invalid(format!(
                "quantity for product {} must be positive, got {}",
                self.product_id, self.quantity
            )));
        }
        let item = self.backend.get_inventory(self.product_id).await?;
        if item.stock < self.quantity {
            return Err(StepError::InsufficientStock {
                product_id: self.product_id,
                available: item.stock,
                requested: self.quantity,
            });
        }
        self.backend.adjust_inventory(self.product_id, -self.quantity).await?;
        Ok(())
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        self.backend.adjust_inventory(self.product_id, self.quantity).await?;
        Ok(())
    }
}

/// Charges the customer; compensation refunds the charge.
pub struct ChargePayment {
    backend: Arc<dyn CommerceBackend>,
    amount: f64,
    customer_id: String,
}

impl ChargePayment {
    pub fn new(backend: Arc<dyn CommerceBackend>, amount: f64, customer_id: impl Into<String>) -> Self {
        Self {
            backend,
            amount,
            customer_id: customer_id.into(),
        }
    }
}

#[async_trait]
impl SagaStep for ChargePayment {
    fn name(&self) -> &str {
        PAYMENT_STEP
    }

    async fn execute(&self, ctx: &mut SagaContext) -> Result<(), StepError> {
        let charge = self.backend.charge_payment(self.amount, &self.customer_id).await?;
        ctx.insert(CHARGE_ID, charge.charge_id);
        Ok(())
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let charge_id = ctx
            .get(CHARGE_ID)
            .ok_or_else(|| StepError::Invalid("no charge to refund".into()))?;
        self.backend.refund_payment(charge_id).await?;
        Ok(())
    }
}

/// Reserve every item, then charge the total.
pub fn order_fulfillment_saga(backend: Arc<dyn CommerceBackend>, request: &FulfillmentRequest) -> Saga {
    let saga = request
        .items
        .iter()
        .fold(Saga::new(format!("order-{}", request.order_id)), |saga, item| {
            saga.step(ReserveStock::new(backend.clone(), item.product_id, item.quantity))
        });
    saga.step(ChargePayment::new(backend, request.total_amount, request.customer_id.clone()))
}

/// Run [`order_fulfillment_saga`] and classify the result.
pub async fn fulfill_order(backend: Arc<dyn CommerceBackend>, request: &FulfillmentRequest) -> FulfillmentReport {
    if request.items.is_empty() {
        return FulfillmentReport {
            status: FulfillmentStatus::Failed,
            message: format!("Order {} has no items.", request.order_id),
            charge_id: None,
            saga: SagaOutcome::default(),
        };
    }

    let mut ctx = SagaContext::new();
    let outcome = order_fulfillment_saga(backend, request).run(&mut ctx).await;

    let (status, message) = match &outcome.failed {
        None => (
            FulfillmentStatus::OrderConfirmed,
            format!(
                "Order {} confirmed successfully. Payment processed and inventory reserved.",
                request.order_id
            ),
        ),
        Some(FailedStep {
            error: StepError::InsufficientStock { product_id, .. },
            ..
        }) => (
            FulfillmentStatus::OutOfStock,
            format!("Product {product_id} is out of stock. No payment was taken."),
        ),
        Some(failed) if failed.step == PAYMENT_STEP => (
            FulfillmentStatus::PaymentFailed,
            format!("Payment failed: {}. Reserved inventory has been released.", failed.error),
        ),
        Some(failed) => (
            FulfillmentStatus::Failed,
            format!("Order {} could not be fulfilled: {}", request.order_id, failed.error),
        ),
    };

    info!(order_id = request.order_id, status = ?status, "Order fulfillment finished");
    FulfillmentReport {
        status,
        message,
        charge_id: outcome
            .succeeded()
            .then(|| ctx.get(CHARGE_ID).map(str::to_string))
            .flatten(),
        saga: outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_backend::{BackendCall, InMemoryBackend};

    fn request(items: Vec<(i64, i64)>, total: f64) -> FulfillmentRequest {
        FulfillmentRequest {
            order_id: 2001,
            customer_id: "cus_9".into(),
            items: items
                .into_iter()
                .map(|(product_id, quantity)| FulfillmentItem { product_id, quantity })
                .collect(),
            total_amount: total,
        }
    }

    #[tokio::test]
    async fn confirmed_order_reserves_and_charges() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let report = fulfill_order(backend.clone(), &request(vec![(5, 2), (7, 1)], 329.97)).await;

        assert_eq!(report.status, FulfillmentStatus::OrderConfirmed);
        assert!(report.charge_id.is_some());
        assert_eq!(report.saga.completed, vec!["reserve-5", "reserve-7", "charge-payment"]);
        assert!(report.saga.compensated.is_empty());
        assert_eq!(backend.stock_of(5), Some(48));
        assert_eq!(backend.stock_of(7), Some(39));
    }

    #[tokio::test]
    async fn out_of_stock_releases_earlier_reservations() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        // Product 3 has no stock.
        let report = fulfill_order(backend.clone(), &request(vec![(5, 2), (3, 1)], 1759.97)).await;

        assert_eq!(report.status, FulfillmentStatus::OutOfStock);
        assert_eq!(report.saga.completed, vec!["reserve-5"]);
        assert_eq!(report.saga.compensated, vec!["reserve-5"]);
        assert_eq!(backend.stock_of(5), Some(50));
        assert!(backend.calls_of("charge_payment").is_empty());
    }

    #[tokio::test]
    async fn payment_failure_releases_every_reservation() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        backend.fail_on("charge_payment", BackendError::Declined("card declined".into()));

        let report = fulfill_order(backend.clone(), &request(vec![(5, 2), (7, 1)], 329.97)).await;

        assert_eq!(report.status, FulfillmentStatus::PaymentFailed);
        assert!(report.message.contains("card declined"));
        assert_eq!(report.saga.compensated, vec!["reserve-7", "reserve-5"]);
        assert_eq!(backend.stock_of(5), Some(50));
        assert_eq!(backend.stock_of(7), Some(40));
        assert!(report.charge_id.is_none());
    }

    #[tokio::test]
    async fn unknown_product_is_a_plain_failure() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let report = fulfill_order(backend, &request(vec![(999, 1)], 10.0)).await;
        assert_eq!(report.status, FulfillmentStatus::Failed);
        assert!(report.message.contains("not found"));
    }

    #[tokio::test]
    async fn empty_order_runs_nothing() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let report = fulfill_order(backend.clone(), &request(vec![], 10.0)).await;
        assert_eq!(report.status, FulfillmentStatus::Failed);
        assert!(backend.calls().is_empty());
    }

    struct AlwaysFails;

    #[async_trait]
    impl SagaStep for AlwaysFails {
        fn name(&self) -> &str {
            "create-order"
        }
        async fn execute(&self, _ctx: &mut SagaContext) -> Result<(), StepError> {
            Err(StepError::Invalid("order service rejected the order".into()))
        }
        async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
            unreachable!("a failed step is never compensated")
        }
    }

    #[tokio::test]
    async fn failure_after_payment_refunds_the_charge() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let saga = order_fulfillment_saga(backend.clone(), &request(vec![(7, 1)], 69.99)).step(AlwaysFails);

        let mut ctx = SagaContext::new();
        let outcome = saga.run(&mut ctx).await;

        assert_eq!(outcome.failed.as_ref().map(|f| f.step.as_str()), Some("create-order"));
        assert_eq!(outcome.compensated, vec!["charge-payment", "reserve-7"]);
        assert_eq!(backend.calls_of("refund_payment").len(), 1);
        assert_eq!(backend.stock_of(7), Some(40));
    }

    #[tokio::test]
    async fn compensation_failures_are_reported() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        let saga = order_fulfillment_saga(backend.clone(), &request(vec![(7, 1)], 69.99)).step(AlwaysFails);
        backend.fail_on("refund_payment", BackendError::Unavailable("payments down".into()));

        let outcome = saga.run(&mut SagaContext::new()).await;

        assert_eq!(outcome.compensated, vec!["reserve-7"]);
        assert_eq!(outcome.compensation_failures.len(), 1);
        assert_eq!(outcome.compensation_failures[0].step, "charge-payment");
        // The remaining compensations still ran.
        assert_eq!(backend.stock_of(7), Some(40));
    }

    #[test]
    fn saga_lists_steps_in_order() {
        let backend: Arc<dyn CommerceBackend> = Arc::new(InMemoryBackend::new());
        let saga = order_fulfillment_saga(backend, &request(vec![(1, 1), (2, 3)], 10.0));
        assert_eq!(saga.name(), "order-2001");
        assert_eq!(saga.step_names(), vec!["reserve-1", "reserve-2", "charge-payment"]);
    }

    #[test]
    fn outcome_serializes_errors_as_text() {
        let outcome = SagaOutcome {
            completed: vec!["reserve-1".into()],
            failed: Some(FailedStep {
                step: "charge-payment".into(),
                error: StepError::Backend(BackendError::Declined("card declined".into())),
            }),
            compensated: vec!["reserve-1".into()],
            compensation_failures: vec![],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["failed"]["error"], "Payment declined: card declined");
        assert!(json.get("compensation_failures").is_none());
    }

    #[test]
    fn request_parses_from_json() {
        let request: FulfillmentRequest = serde_json::from_str(
            r#"{"order_id": 7, "customer_id": "cus_1", "items": [{"product_id": 5, "quantity": 1}], "total_amount": 129.99}"#,
        )
        .unwrap();
        assert_eq!(request.items[0].product_id, 5);
        assert_eq!(
            serde_json::to_value(FulfillmentStatus::OutOfStock).unwrap(),
            "OUT_OF_STOCK"
        );
    }

    #[tokio::test]
    async fn compensations_run_in_reverse() {
        let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
        backend.fail_on("charge_payment", BackendError::Declined("nope".into()));
        fulfill_order(backend.clone(), &request(vec![(5, 1), (7, 1)], 199.98)).await;

        let adjustments: Vec<_> = backend
            .calls_of("adjust_inventory")
            .into_iter()
            .map(|call| match call {
                BackendCall::AdjustInventory { product_id, delta } => (product_id, delta),
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(adjustments, vec![(5, -1), (7, -1), (7, 1), (5, 1)]);
    }
}
