//! Specialist dispatch — turn a routing decision into backend calls and a reply.
//!
//! Every backend fault is answered here. `NotFound` is reported to the
//! customer directly; anything transient becomes an apology asking them to
//! try again. Nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use concierge_core::backend::{
    CasePriority, CommerceBackend, InventoryItem, NewOrder, NewReturn, NewSupportCase, OrderLine,
};
use concierge_core::error::BackendError;
use concierge_core::event::{DomainEvent, EventBus};
use concierge_core::routing::Category;
use concierge_core::session::{PendingAction, ProposedAction, Session};
use tracing::{info, warn};

use crate::extract::{self, Reply};

/// Return reason sent for chat-initiated returns.
const CHAT_RETURN_REASON: &str = "Customer request via chat";

/// Subject of the case opened for CRM update requests.
pub const CRM_CASE_SUBJECT: &str = "Account update request";

/// How many catalogue lines a product suggestion shows.
const SUGGESTION_LIMIT: usize = 5;

pub const CAPABILITY_MENU: &str = "Hello! I'm here to help you today.\n\n\
I can assist with:\n\
• Order tracking and status\n\
• Returns and refunds\n\
• Product availability\n\
• Security concerns\n\
• Urgent issues\n\n\
What can I help you with?";

pub const FRAUD_GUIDANCE: &str = "**Security Alert**\n\n\
I take this very seriously. Here's what you should do **immediately**:\n\n\
1. Contact your bank to report the unauthorized transaction\n\
2. Change your password on our website\n\
3. Reply with details (amount, date) so I can escalate to our security team\n\n\
We'll investigate this thoroughly. Your account security is our priority.";

pub const ESCALATION_GUIDANCE: &str = "I sincerely apologize for your experience. \
As a senior manager, I'm personally taking ownership of this issue.\n\n\
**Priority Escalation Initiated**\n\n\
I'm escalating your case to our executive team right now. To ensure swift resolution:\n\n\
1. Provide your preferred contact (phone/email)\n\
2. Brief description of the issue\n\
3. Any order/reference numbers\n\n\
You'll receive a response within **24 hours**. I'll personally monitor this.";

/// Friendly text for an order status. Case-insensitive; unknown statuses map to "".
pub fn status_message(status: &str) -> &'static str {
    match status.to_ascii_uppercase().as_str() {
        "SHIPPED" => "Your order is on the way!",
        "DELIVERED" => "Your order has been delivered.",
        "PROCESSING" => "We're preparing your order for shipment.",
        "PENDING" => "Your order is being processed.",
        "CANCELLED" => "This order has been cancelled.",
        _ => "",
    }
}

fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn product_lines(items: &[InventoryItem]) -> String {
    items
        .iter()
        .take(SUGGESTION_LIMIT)
        .map(|item| format!("• {} - ${:.2}", item.name, item.price))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Executes the specialist branch for a routed message.
pub struct Dispatcher {
    backend: Arc<dyn CommerceBackend>,
    customer_id: i64,
    event_bus: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn CommerceBackend>) -> Self {
        Self {
            backend,
            customer_id: 1,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Customer id attached to orders created from chat.
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Run the branch for `category`. May set or clear `session.pending`.
    pub async fn dispatch(&self, category: Category, message: &str, session: &mut Session) -> String {
        match category {
            Category::Returns => self.returns(message).await,
            Category::Order => self.order(message, session).await,
            Category::Inventory => self.inventory(message).await,
            Category::CrmSync => self.crm_sync(message, &session.user).await,
            Category::Fraud => FRAUD_GUIDANCE.to_string(),
            Category::Escalation => ESCALATION_GUIDANCE.to_string(),
        }
    }

    // ── Returns ────────────────────────────────────────────────────

    async fn returns(&self, message: &str) -> String {
        let Some(order_id) = extract::order_id(message) else {
            return "I'd be happy to help you process a return. Could you please provide your \
                    order number? (e.g., #1001)"
                .to_string();
        };
        let Ok(id) = order_id.parse::<i64>() else {
            return format!("I couldn't find order #{order_id} in our system. Please double-check the order number.");
        };

        let request = NewReturn {
            order_id: id,
            reason: CHAT_RETURN_REASON.to_string(),
            refund_amount: 0.0,
        };
        match self.backend.create_return(request).await {
            Ok(created) => {
                info!(order_id = id, return_id = created.id, "Return created");
                format!(
                    "I've successfully processed your return for order #{order_id}.\n\n\
                     **Return Details:**\n\
                     • Return ID: #{return_id}\n\
                     • Status: {status}\n\
                     • Reason: {reason}\n\n\
                     Your refund will be processed within 3-5 business days and credited to your \
                     original payment method.\n\n\
                     Is there anything else I can help you with?",
                    return_id = created.id,
                    status = title_case(&created.status),
                    reason = created.reason,
                )
            }
            Err(BackendError::Unavailable(e)) => {
                warn!(order_id = id, error = %e, "Returns service unavailable");
                "I'm having trouble connecting to our returns system. Please try again in a moment \
                 or contact support."
                    .to_string()
            }
            Err(e) => {
                warn!(order_id = id, error = %e, "Return rejected");
                format!(
                    "I encountered an issue processing the return for order #{order_id}. Please try \
                     again or contact support."
                )
            }
        }
    }

    // ── Orders ─────────────────────────────────────────────────────

    async fn order(&self, message: &str, session: &mut Session) -> String {
        if let Some(pending) = session.pending.clone() {
            match extract::reply(message) {
                Some(Reply::Confirm) => return self.confirm_pending(pending, session).await,
                Some(Reply::Cancel) => {
                    session.clear_pending();
                    self.pending_changed(&session.user, "cancelled");
                    return "No problem! I've cancelled that order request. Let me know if you'd \
                            like to order something else."
                        .to_string();
                }
                None => {}
            }
        }

        let order_id = extract::order_id(message);
        let purchase = extract::is_purchase_intent(message);

        if purchase {
            self.purchase(message, session).await
        } else if let Some(order_id) = order_id {
            self.track(&order_id).await
        } else {
            "I can help you track your order! Please provide your order number (e.g., #123)."
                .to_string()
        }
    }

    async fn confirm_pending(&self, pending: PendingAction, session: &mut Session) -> String {
        let ProposedAction::Purchase { product } = pending.action;
        let order = NewOrder {
            user_id: self.customer_id,
            total_amount: product.price,
            items: vec![OrderLine {
                product_id: product.id,
                quantity: 1,
                price: product.price,
            }],
        };

        match self.backend.create_order(order).await {
            Ok(created) => {
                session.clear_pending();
                self.pending_changed(&session.user, "confirmed");
                info!(user = %session.user, order_id = created.id, product_id = product.id, "Order created from chat");
                format!(
                    "**Order Confirmed!**\n\n\
                     **Order Details:**\n\
                     • Order ID: #{order_id}\n\
                     • Product: {name}\n\
                     • Price: ${price:.2}\n\
                     • Status: Processing\n\n\
                     Your order is being prepared for shipment. You'll receive a confirmation email \
                     shortly!\n\n\
                     Is there anything else I can help you with?",
                    order_id = created.id,
                    name = product.name,
                    price = product.price,
                )
            }
            Err(BackendError::Unavailable(e)) => {
                warn!(user = %session.user, error = %e, "Order service unavailable");
                "I'm having trouble creating your order. Please try again in a moment or contact \
                 support."
                    .to_string()
            }
            Err(e) => {
                warn!(user = %session.user, error = %e, "Order creation rejected");
                "I encountered an issue creating your order. Please try again or contact support."
                    .to_string()
            }
        }
    }

    async fn purchase(&self, message: &str, session: &mut Session) -> String {
        let items = match self.backend.list_inventory().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Inventory lookup failed");
                return "I'm having trouble connecting to our inventory system. Please try again."
                    .to_string();
            }
        };

        let keywords = extract::product_keywords(message);
        if keywords.is_empty() {
            return format!(
                "I'd be happy to help you place an order!\n\n\
                 **Available Products:**\n{}\n\n\
                 What would you like to order?",
                product_lines(&items)
            );
        }

        // First catalogue item whose name contains any keyword.
        let found = items.iter().find(|item| {
            let name = item.name.to_lowercase();
            keywords.iter().any(|kw| name.contains(kw))
        });
        let Some(product) = found else {
            return format!(
                "I couldn't find a product matching your search. Here are some available products:\n\n\
                 {}\n\n\
                 What would you like to order?",
                product_lines(&items)
            );
        };

        if !product.in_stock() {
            return format!(
                "Sorry, **{}** is currently out of stock. Would you like me to notify you when it's \
                 back in stock?",
                product.name
            );
        }

        let reply = format!(
            "Great! I found **{name}** in our inventory.\n\n\
             **Product Details:**\n\
             • Price: ${price:.2}\n\
             • In Stock: {stock} units available\n\
             • SKU: {sku}\n\n\
             Reply **'yes'** to place this order, or **'no'** to cancel.",
            name = product.name,
            price = product.price,
            stock = product.stock,
            sku = product.sku,
        );
        if session.set_pending(PendingAction::purchase(product.clone())).is_some() {
            info!(user = %session.user, "Replaced an earlier pending purchase");
        }
        self.pending_changed(&session.user, "created");
        reply
    }

    async fn track(&self, order_id: &str) -> String {
        let Ok(id) = order_id.parse::<i64>() else {
            return format!("I couldn't find order #{order_id} in our system. Please double-check the order number.");
        };

        match self.backend.get_order(id).await {
            Ok(order) => format!(
                "**Order #{order_id}** - Status: **{status}**\n\n\
                 • Total Amount: ${total:.2}\n\
                 • Order Date: {date}\n\n\
                 {note}\n\n\
                 Need help with anything else?",
                status = order.status,
                total = order.total_amount,
                date = order.created_at.as_deref().unwrap_or("N/A"),
                note = status_message(&order.status),
            ),
            Err(BackendError::NotFound { .. }) => format!(
                "I couldn't find order #{order_id} in our system. Please double-check the order number."
            ),
            Err(e) => {
                warn!(order_id = id, error = %e, "Order lookup failed");
                "I'm having trouble connecting to our order system. Please try again in a moment."
                    .to_string()
            }
        }
    }

    // ── Inventory ──────────────────────────────────────────────────

    async fn inventory(&self, message: &str) -> String {
        let Some(keyword) = extract::product_keyword(message) else {
            return "I can help you check product availability. What are you looking for? \
                    (e.g., gaming laptop, keyboard)"
                .to_string();
        };

        let items = match self.backend.list_inventory().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Inventory lookup failed");
                return "I'm having trouble connecting to our inventory system. Please try again."
                    .to_string();
            }
        };

        let Some(item) = items.iter().find(|i| i.name.to_lowercase().contains(keyword)) else {
            return format!("I couldn't find a product matching '{keyword}'. Could you be more specific?");
        };

        if item.in_stock() {
            format!(
                "Yes! **{name}** is in stock!\n\n\
                 • Available: {stock} units\n\
                 • Price: ${price:.2}\n\
                 • SKU: {sku}\n\n\
                 Would you like to place an order?",
                name = item.name,
                stock = item.stock,
                price = item.price,
                sku = item.sku,
            )
        } else {
            format!(
                "Sorry, **{}** is currently out of stock. Would you like me to notify you when it's back?",
                item.name
            )
        }
    }

    // ── CRM ────────────────────────────────────────────────────────

    async fn crm_sync(&self, message: &str, user: &str) -> String {
        let case = NewSupportCase {
            customer_email: user.to_string(),
            subject: CRM_CASE_SUBJECT.to_string(),
            description: message.to_string(),
            priority: CasePriority::Medium,
        };
        match self.backend.create_support_case(case).await {
            Ok(created) => {
                info!(user = %user, case_id = %created.case_id, "CRM update case opened");
                format!(
                    "I've logged your account update request with our customer records team.\n\n\
                     • Case ID: {}\n\n\
                     You'll receive a confirmation once your details are updated. Is there anything \
                     else I can help you with?",
                    created.case_id
                )
            }
            Err(e) => {
                warn!(user = %user, error = %e, "Support case creation failed");
                "I'm having trouble reaching our customer records system. Please try again in a \
                 moment or contact support."
                    .to_string()
            }
        }
    }

    fn pending_changed(&self, user: &str, change: &str) {
        self.event_bus.publish(DomainEvent::PendingActionChanged {
            user: user.to_string(),
            change: change.to_string(),
            timestamp: Utc::now(),
        });
    }
}
