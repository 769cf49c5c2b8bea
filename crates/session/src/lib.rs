//! Session storage for Concierge.
//!
//! - [`InMemorySessionStore`]: process-lifetime sessions with versioned writes.
//! - [`SessionLocks`]: one async mutex per user, so a user's messages are
//!   handled strictly one at a time while different users proceed in parallel.

pub mod in_memory;
pub mod locks;

pub use in_memory::InMemorySessionStore;
pub use locks::SessionLocks;
