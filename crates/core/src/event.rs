//! Domain event system — decoupled notifications from the loop and the chat pipeline.
//!
//! Publishing never blocks and never fails; nobody is required to subscribe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::routing::Category;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A customer message was assigned a category
    MessageRouted {
        user: String,
        category: Category,
        /// Which tier decided ("pending_action", "classifier", "override", "default")
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed inside a task
    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A task or chat turn produced its final text
    ResponseGenerated {
        context: String,
        iterations: u32,
        tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// A pending action was created, confirmed, cancelled or expired
    PendingActionChanged {
        user: String,
        change: String,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_routing_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::MessageRouted {
            user: "ana@example.com".into(),
            category: Category::Returns,
            source: "override".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::MessageRouted { category, source, .. } => {
                assert_eq!(*category, Category::Returns);
                assert_eq!(source, "override");
            }
            _ => panic!("Expected MessageRouted event"),
        }
    }

    #[test]
    fn publish_without_subscribers() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::ErrorOccurred {
            context: "test".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }
}
