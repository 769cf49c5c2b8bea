//! Parameter extraction from a customer message.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::lexicon::{self, contains_any, normalize};

/// A short answer to a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Confirm,
    Cancel,
}

/// An order id needs an explicit `order` or `#` marker before 3–5 digits,
/// so SKUs like `GLAP-4060` are never read as order ids.
fn order_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:order\s*#?\s*|#)(\d{3,5})").expect("order id pattern is valid")
    })
}

/// The first order id in the message, as written.
pub fn order_id(message: &str) -> Option<String> {
    order_id_pattern()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Exact or substring match against the reply lexicons. Confirmation wins
/// when a message carries both.
pub fn reply(message: &str) -> Option<Reply> {
    let text = normalize(message);
    if contains_any(&text, lexicon::CONFIRMATION) {
        Some(Reply::Confirm)
    } else if contains_any(&text, lexicon::CANCELLATION) {
        Some(Reply::Cancel)
    } else {
        None
    }
}

pub fn is_purchase_intent(message: &str) -> bool {
    contains_any(&normalize(message), lexicon::PURCHASE)
}

/// Every product keyword in the message, in vocabulary order.
pub fn product_keywords(message: &str) -> Vec<&'static str> {
    let text = normalize(message);
    lexicon::PRODUCTS
        .iter()
        .copied()
        .filter(|kw| text.contains(kw))
        .collect()
}

/// The first product keyword in vocabulary order.
pub fn product_keyword(message: &str) -> Option<&'static str> {
    product_keywords(message).into_iter().next()
}
