//! Keyword lexicons and the text normalization they are matched against.
//!
//! Matching runs on [`normalize`]d text: lowercase, punctuation folded to
//! spaces, whitespace collapsed, padded with one space on each side. A
//! phrase with surrounding spaces (`" return "`) therefore only matches a
//! whole word, while a bare phrase (`"complain"`) also matches inside
//! longer words (`"complaint"`).

/// Replies that confirm a pending action.
pub const CONFIRMATION: &[&str] = &[
    "yes", "confirm", "place order", "order it", "sure", "ok", "okay", "proceed",
];

/// Replies that cancel a pending action.
pub const CANCELLATION: &[&str] = &["no", "cancel", "nevermind", "never mind", "changed my mind"];

/// Phrases that mark a request to buy something.
pub const PURCHASE: &[&str] = &[
    "buy",
    "purchase",
    "order a",
    "place an order",
    "place order",
    "get a",
    "want a",
    "need a",
    "i want to order",
    "i want to buy",
    "i want to purchase",
    "i'd like to order",
    "i'd like to buy",
    "can i order",
    "can i buy",
    "looking to buy",
    "looking to order",
];

/// Product vocabulary, in match-priority order.
pub const PRODUCTS: &[&str] = &[
    "laptop", "keyboard", "mouse", "monitor", "gaming", "thinkpad", "dell", "lenovo", "rtx",
];

pub const CRM_UPDATE: &[&str] = &[
    "update email",
    "change email",
    "update address",
    "change address",
    "update my email",
    "change my email",
    "crm",
    "account details",
    "update account",
    "change account",
];

pub const RETURNS: &[&str] = &[
    " return ",
    "return ",
    " refund",
    "exchange",
    "send back",
    "send it back",
    "defective",
    "broken",
    "damaged",
    "not working",
    "doesn't work",
    "faulty",
];

pub const FRAUD: &[&str] = &["fraud", "unauthorized", "suspicious", "hacked", "stolen"];

pub const STOCK: &[&str] = &[" stock", "available", "do you have", "in stock", "out of stock"];

pub const ESCALATION: &[&str] = &["manager", "supervisor", "complain", "escalate", "speak to"];

pub const ORDER_INTENT: &[&str] = &[
    " buy ",
    "purchase",
    " order ",
    "want to order",
    "place an order",
    "i want a",
    "i need a",
    "get a",
];

/// Lowercase, fold punctuation to spaces, collapse whitespace, pad.
pub fn normalize(message: &str) -> String {
    let folded: String = message
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\'' => '\'',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();
    let words: Vec<&str> = folded.split_whitespace().collect();
    format!(" {} ", words.join(" ")).to_lowercase()
}

/// Substring match of any phrase.
pub fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| normalized.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_punctuation_and_pads() {
        assert_eq!(normalize("Yes!"), " yes ");
        assert_eq!(normalize("  I want to RETURN order #1001. "), " i want to return order 1001 ");
        assert_eq!(normalize("It doesn\u{2019}t work"), " it doesn't work ");
        assert_eq!(normalize(""), "  ");
    }

    #[test]
    fn reply_phrases_match_inside_longer_words() {
        assert!(contains_any(&normalize("Confirmed!"), CONFIRMATION));
        assert!(contains_any(&normalize("I cancelled it"), CANCELLATION));
        assert!(!contains_any(&normalize("track my parcel"), CONFIRMATION));
    }

    #[test]
    fn padded_phrases_match_at_message_edges() {
        assert!(contains_any(&normalize("return this please"), RETURNS));
        assert!(contains_any(&normalize("stock levels?"), STOCK));
        assert!(contains_any(&normalize("I want to complain"), ESCALATION));
    }
}
