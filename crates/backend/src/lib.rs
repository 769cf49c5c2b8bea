//! Commerce backends for Concierge.
//!
//! - [`HttpBackend`]: calls the order, inventory, returns, payment and CRM
//!   services through the service gateway.
//! - [`InMemoryBackend`]: a seeded, in-process catalogue for tests and the
//!   offline demo mode.

pub mod http;
pub mod in_memory;

pub use http::HttpBackend;
pub use in_memory::{BackendCall, InMemoryBackend};

use std::sync::Arc;

use concierge_config::{BackendConfig, BackendMode};
use concierge_core::CommerceBackend;

/// Build the backend selected by configuration.
pub fn build_from_config(config: &BackendConfig) -> Arc<dyn CommerceBackend> {
    match config.mode {
        BackendMode::Http => Arc::new(HttpBackend::from_config(config)),
        BackendMode::InMemory => Arc::new(InMemoryBackend::with_demo_catalogue()),
    }
}
