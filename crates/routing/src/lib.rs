//! Concierge routing: turning a customer message into a reply.
//!
//! - [`rules`]: the ordered rule table that picks a [`Category`](concierge_core::routing::Category)
//! - [`dispatch`]: runs the chat flow for the chosen category against the backend
//! - [`chat`]: the session-aware pipeline tying both together

pub mod chat;
pub mod dispatch;
pub mod extract;
pub mod lexicon;
pub mod rules;

#[cfg(test)]
mod test_support;

pub use chat::{ChatService, APOLOGY};
pub use dispatch::{Dispatcher, CAPABILITY_MENU};
pub use rules::{default_rules, RouteSource, Router, RoutingDecision, Rule};
