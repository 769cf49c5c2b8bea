//! End-to-end tests for the Concierge pipeline.
//!
//! These exercise the crates together: routing, dispatch and sessions behind
//! the chat service, specialist tasks driven by the tool-calling loop against
//! the in-memory backend, and the fulfillment saga.

use std::sync::Arc;

use concierge_agent::specialists::{escalation, fraud, inventory, returns};
use concierge_agent::{ItemQuantity, TaskRunner};
use concierge_backend::{BackendCall, InMemoryBackend};
use concierge_core::error::{BackendError, ProviderError};
use concierge_core::event::{DomainEvent, EventBus};
use concierge_core::message::{Message, MessageToolCall};
use concierge_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use concierge_core::routing::Category;
use concierge_routing::{ChatService, Dispatcher, Router};
use concierge_session::InMemorySessionStore;
use concierge_tools::{default_registry, names};
use concierge_workflow::{fulfill_order, FulfillmentItem, FulfillmentRequest, FulfillmentStatus};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: std::sync::Mutex<Vec<ProviderResponse>>,
    requests: std::sync::Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        requests.push(request);
        let responses = self.responses.lock().unwrap();
        if count >= responses.len() {
            panic!("ScriptedProvider exhausted: call #{count}, have {}", responses.len());
        }
        Ok(responses[count].clone())
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tool_calls("", tool_calls),
        usage: usage(),
        model: "mock".into(),
    }
}

fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

fn chat_service(
    provider: Arc<ScriptedProvider>,
    backend: Arc<InMemoryBackend>,
    event_bus: Arc<EventBus>,
) -> ChatService {
    let runner = Arc::new(TaskRunner::new(provider, "mock"));
    ChatService::new(
        Router::new().with_classifier(runner, 1),
        Dispatcher::new(backend).with_event_bus(event_bus.clone()),
        Arc::new(InMemorySessionStore::new()),
    )
    .with_event_bus(event_bus)
}

// ── E2E: Chat pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_chat_purchase_confirmation_never_asks_the_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let chat = chat_service(provider.clone(), backend.clone(), Arc::new(EventBus::default()));

    let offer = chat.handle("ana@example.com", "I'd like to buy a Dell").await;
    assert!(offer.contains("Dell Latitude 15"));
    assert!(offer.contains("$899.99"));

    let confirmed = chat.handle("ana@example.com", "Yes please").await;
    assert!(confirmed.contains("Order Confirmed"));
    assert!(confirmed.contains("#2001"));

    assert_eq!(provider.calls(), 0);
    assert_eq!(backend.orders().iter().filter(|o| o.id == 2001).count(), 1);
}

#[tokio::test]
async fn e2e_chat_classifier_handles_unmatched_messages() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response(
        "After reading the message, CATEGORY: ESCALATION",
    )]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let event_bus = Arc::new(EventBus::default());
    let mut events = event_bus.subscribe();
    let chat = chat_service(provider.clone(), backend, event_bus);

    let reply = chat
        .handle("bo@example.com", "This is the third time nobody has called me back")
        .await;
    assert!(reply.contains("Priority Escalation Initiated"));
    assert_eq!(provider.calls(), 1);

    // The classifier gets the message and no tools.
    let request = &provider.requests()[0];
    assert!(request.tools.is_empty());
    assert!(request.messages[1].content.contains("nobody has called me back"));

    let mut routed = None;
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::MessageRouted { category, source, .. } = event.as_ref() {
            routed = Some((*category, source.clone()));
        }
    }
    assert_eq!(routed, Some((Category::Escalation, "classifier".to_string())));
}

#[tokio::test]
async fn e2e_chat_keyword_override_beats_classifier() {
    // No script: a classifier call would panic the provider.
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let chat = chat_service(provider.clone(), backend.clone(), Arc::new(EventBus::default()));

    let reply = chat
        .handle("ana@example.com", "My keyboard from order #1003 arrived broken")
        .await;
    assert!(reply.contains("1003"));
    assert_eq!(backend.calls_of("create_return").len(), 1);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn e2e_chat_history_is_per_user_and_bounded() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let chat = chat_service(provider, backend, Arc::new(EventBus::default())).with_history_limit(4);

    for i in 0..5 {
        chat.handle("ana@example.com", &format!("where is order #100{i}")).await;
    }
    chat.handle("bo@example.com", "where is order #1001").await;

    let ana = chat.history("ana@example.com").await.unwrap();
    assert_eq!(ana.len(), 4);
    assert_eq!(ana[0].text, "where is order #1003");
    assert_eq!(chat.history("bo@example.com").await.unwrap().len(), 2);
}

// ── E2E: Specialist tasks ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_fraud_task_scores_with_local_tool() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            names::ANALYZE_TRANSACTION_PATTERN,
            serde_json::json!({
                "customer_id": "cus_42",
                "transaction_amount": 6000.0,
                "transaction_count_24h": 12
            }),
        )]),
        text_response("Risk is HIGH. Decision: BLOCKED"),
    ]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let tools = default_registry(backend.clone());
    let runner = TaskRunner::new(provider.clone(), "mock");

    let review = fraud::TransactionReview {
        customer_id: "cus_42".into(),
        transaction_amount: 6000.0,
        transaction_count_24h: 12,
        customer_email: None,
    };
    let outcome = fraud::analyze_transaction(&runner, &tools, &review).await.unwrap();
    assert_eq!(outcome.status, fraud::FraudStatus::Blocked);
    assert_eq!(outcome.tool_calls_made, 1);

    // The tool result fed back to the model carries the local risk score.
    let second = &provider.requests()[1];
    let tool_result = second.messages.last().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&tool_result.content).unwrap();
    assert_eq!(parsed["risk_score"], 100);
    assert_eq!(parsed["recommendation"], "BLOCK");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn e2e_returns_task_refunds_and_restocks() {
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let charge = {
        use concierge_core::backend::CommerceBackend;
        backend.charge_payment(129.99, "cus_7").await.unwrap()
    };

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            names::REFUND_PAYMENT,
            serde_json::json!({"charge_id": charge.charge_id}),
        )]),
        tool_response(vec![make_tool_call(
            names::UPDATE_INVENTORY,
            serde_json::json!({"product_id": 5, "quantity_change": 1}),
        )]),
        text_response("RETURN_COMPLETED"),
    ]));
    let tools = default_registry(backend.clone());
    let runner = TaskRunner::new(provider, "mock");

    let request = returns::ReturnRequest {
        return_id: 1,
        order_id: 1003,
        customer_id: "cus_7".into(),
        items: vec![ItemQuantity {
            product_id: 5,
            quantity: 1,
        }],
        reason: Some("Defective".into()),
        charge_id: charge.charge_id.clone(),
    };
    let outcome = returns::process_return(&runner, &tools, &request).await.unwrap();

    assert_eq!(outcome.status, returns::ReturnStatus::ReturnCompleted);
    assert_eq!(backend.stock_of(5), Some(51));
    assert_eq!(
        backend.calls_of("refund_payment"),
        vec![BackendCall::RefundPayment(charge.charge_id)]
    );
}

#[tokio::test]
async fn e2e_escalation_task_opens_high_priority_case() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            names::CREATE_SUPPORT_CASE,
            serde_json::json!({
                "customer_email": "ana@example.com",
                "subject": "ESCALATION: Third late delivery",
                "description": "Third late delivery this month",
                "priority": "High"
            }),
        )]),
        text_response("Case CASE-00001 created and escalated."),
    ]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let tools = default_registry(backend.clone());
    let runner = TaskRunner::new(provider, "mock");

    let request = escalation::EscalationRequest {
        customer_email: "ana@example.com".into(),
        issue_description: "Third late delivery this month".into(),
        severity: None,
        customer_name: None,
    };
    let outcome = escalation::escalate_issue(&runner, &tools, &request).await.unwrap();

    assert_eq!(outcome.status, escalation::EscalationStatus::Escalated);
    let cases = backend.support_cases();
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].priority, concierge_core::backend::CasePriority::High);
}

#[tokio::test]
async fn e2e_inventory_task_recommends_reorder() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            names::CHECK_INVENTORY,
            serde_json::json!({"product_id": 3}),
        )]),
        text_response("Stock is 0, below threshold 10. REORDER recommended."),
    ]));
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    let tools = default_registry(backend);
    let runner = TaskRunner::new(provider, "mock");

    let outcome = inventory::analyze_inventory(&runner, &tools, &inventory::InventoryAnalysisRequest::new(3))
        .await
        .unwrap();
    assert_eq!(outcome.status, inventory::InventoryStatus::ReorderRecommended);
    assert_eq!(outcome.details["recommended_quantity"], 20);
}

// ── E2E: Fulfillment saga ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_fulfillment_declined_payment_restores_stock() {
    let backend = Arc::new(InMemoryBackend::with_demo_catalogue());
    backend.fail_on("charge_payment", BackendError::Declined("insufficient funds".into()));

    let request = FulfillmentRequest {
        order_id: 3001,
        customer_id: "cus_1".into(),
        items: vec![
            FulfillmentItem {
                product_id: 1,
                quantity: 1,
            },
            FulfillmentItem {
                product_id: 11,
                quantity: 3,
            },
        ],
        total_amount: 1419.96,
    };
    let report = fulfill_order(backend.clone(), &request).await;

    assert_eq!(report.status, FulfillmentStatus::PaymentFailed);
    assert_eq!(backend.stock_of(1), Some(15));
    assert_eq!(backend.stock_of(11), Some(45));
    assert_eq!(report.saga.compensated, vec!["reserve-11", "reserve-1"]);
}
