//! The chat pipeline: session → routing → dispatch → session.
//!
//! [`ChatService::handle`] always produces a reply. Faults that escape the
//! dispatch layer become a generic apology; they never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use concierge_agent::TaskRunner;
use concierge_config::AppConfig;
use concierge_core::backend::CommerceBackend;
use concierge_core::error::SessionError;
use concierge_core::event::{DomainEvent, EventBus};
use concierge_core::session::{SessionStore, Turn};
use concierge_session::SessionLocks;
use tracing::{debug, error, info, warn};

use crate::dispatch::{Dispatcher, CAPABILITY_MENU};
use crate::rules::Router;

/// Reply used whenever the pipeline itself fails.
pub const APOLOGY: &str =
    "I apologize, but I encountered an error. Please try again or contact support.";

const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct ChatService {
    router: Router,
    dispatcher: Dispatcher,
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    history_limit: usize,
    pending_ttl: Option<chrono::Duration>,
    reply_timeout: Option<Duration>,
    event_bus: Arc<EventBus>,
}

impl ChatService {
    pub fn new(router: Router, dispatcher: Dispatcher, store: Arc<dyn SessionStore>) -> Self {
        Self {
            router,
            dispatcher,
            store,
            locks: SessionLocks::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            pending_ttl: None,
            reply_timeout: None,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Wire the full pipeline from config. Without a runner the classifier
    /// tier is skipped and unmatched messages fall through to ORDER.
    pub fn from_config(
        config: &AppConfig,
        runner: Option<Arc<TaskRunner>>,
        backend: Arc<dyn CommerceBackend>,
        store: Arc<dyn SessionStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut router = Router::new();
        if let Some(runner) = runner {
            router = router.with_classifier(runner, config.routing.classifier_max_iterations);
        }
        let dispatcher = Dispatcher::new(backend)
            .with_customer_id(config.chat.default_customer_id)
            .with_event_bus(event_bus.clone());

        let mut service = Self::new(router, dispatcher, store)
            .with_history_limit(config.chat.history_limit)
            .with_reply_timeout(config.chat.reply_timeout())
            .with_event_bus(event_bus);
        if let Some(ttl) = config.chat.pending_action_ttl() {
            service = service.with_pending_ttl(ttl);
        }
        service
    }

    /// Retained turns per user (customer and agent turns both count).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Drop pending actions older than `ttl` before routing.
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = chrono::Duration::from_std(ttl).ok();
        self
    }

    /// Abandon a turn that takes longer than `timeout`.
    ///
    /// Side effects already committed by the turn are not undone, and the
    /// session is left as it was before the turn.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Handle one customer message and return the reply.
    pub async fn handle(&self, user: &str, message: &str) -> String {
        let turn = self.process(user, message);
        let result = match self.reply_timeout {
            Some(limit) => match tokio::time::timeout(limit, turn).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(user = %user, timeout_secs = limit.as_secs(), "Chat turn timed out");
                    self.report_error("chat_timeout", "turn exceeded reply timeout");
                    return APOLOGY.to_string();
                }
            },
            None => turn.await,
        };

        result.unwrap_or_else(|e| {
            error!(user = %user, error = %e, "Chat turn failed");
            self.report_error("chat", &e.to_string());
            APOLOGY.to_string()
        })
    }

    async fn process(&self, user: &str, message: &str) -> Result<String, SessionError> {
        let _guard = self.locks.acquire(user).await;
        let mut session = self.store.load_or_new(user).await?;

        if let Some(ttl) = self.pending_ttl {
            if session.expire_pending(ttl, Utc::now()) {
                info!(user = %user, "Pending action expired");
                self.event_bus.publish(DomainEvent::PendingActionChanged {
                    user: user.to_string(),
                    change: "expired".into(),
                    timestamp: Utc::now(),
                });
            }
        }

        session.push_turn(Turn::customer(message), self.history_limit);

        let reply = if message.trim().is_empty() {
            CAPABILITY_MENU.to_string()
        } else {
            let decision = self.router.route(&session, message).await;
            info!(
                user = %user,
                category = %decision.category,
                source = decision.source.as_str(),
                "Message routed"
            );
            self.event_bus.publish(DomainEvent::MessageRouted {
                user: user.to_string(),
                category: decision.category,
                source: decision.source.as_str().to_string(),
                timestamp: Utc::now(),
            });
            self.dispatcher
                .dispatch(decision.category, message, &mut session)
                .await
        };

        session.push_turn(Turn::agent(reply.as_str()), self.history_limit);

        // The reply stands even if saving fails: backend side effects have
        // already happened and an apology would invite a duplicate request.
        if let Err(e) = self.store.compare_and_swap(session).await {
            error!(user = %user, error = %e, "Failed to save session");
            self.report_error("session_save", &e.to_string());
        } else {
            debug!(user = %user, "Session saved");
        }

        Ok(reply)
    }

    /// The user's retained turns, oldest first. Empty for unknown users.
    pub async fn history(&self, user: &str) -> Result<Vec<Turn>, SessionError> {
        Ok(self
            .store
            .get(user)
            .await?
            .map(|s| s.history.into_iter().collect())
            .unwrap_or_default())
    }

    fn report_error(&self, context: &str, message: &str) {
        self.event_bus.publish(DomainEvent::ErrorOccurred {
            context: context.to_string(),
            error_message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}
