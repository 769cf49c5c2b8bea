//! # Concierge Core
//!
//! Domain types, traits, and error definitions for the Concierge
//! customer-support agent runtime. This crate has **no framework
//! dependencies**: it defines the domain model every other crate
//! implements against.
//!
//! ## Layout
//!
//! Every external collaborator is a trait here, with implementations in
//! their own crates:
//! - [`Provider`]: the model invocation gateway
//! - [`Tool`]: a named, schema-described callable operation
//! - [`CommerceBackend`]: order, inventory, returns, payment and case services
//! - [`SessionStore`]: per-user conversation state

pub mod backend;
pub mod error;
pub mod event;
pub mod message;
pub mod persona;
pub mod provider;
pub mod routing;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use backend::{
    CasePriority, Charge, CommerceBackend, InventoryItem, NewOrder, NewReturn, NewSupportCase,
    OrderLine, OrderRecord, Refund, ReturnRecord, SupportCase,
};
pub use error::{AgentError, BackendError, Error, ProviderError, Result, SessionError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageToolCall, Role};
pub use persona::Persona;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use routing::Category;
pub use session::{PendingAction, ProposedAction, Session, SessionStore, Speaker, Turn};
pub use tool::{Tool, ToolRegistry, ToolResult};
