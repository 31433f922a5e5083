//! Synchronous in-process event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use super::types::Event;

/// Failure reported by an event handler.
///
/// Handler failures never abort fan-out; the bus logs them and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event handler failed: {message}")]
pub struct HandlerError {
    /// What went wrong, from the handler's perspective.
    pub message: String,
}

impl HandlerError {
    /// Creates a handler error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Processes published events.
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returning an error is recorded but does not affect other handlers.
    fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self(event)
    }
}

/// Token returned at subscribe time; the handle for unsubscription.
///
/// Registering the same handler twice yields two tokens, and both
/// registrations are delivered to, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    token: SubscriptionId,
    handler: Arc<dyn EventHandler>,
}

/// In-process event bus with synchronous fan-out.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<String, Vec<Registration>>>,
    next_token: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an event type and returns its token.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> SubscriptionId {
        let token = SubscriptionId(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscriptions
            .entry(event_type.into())
            .or_default()
            .push(Registration { token, handler });
        token
    }

    /// Removes the registration identified by the token.
    ///
    /// Returns false if the token was already removed or never issued.
    pub fn unsubscribe(&self, token: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for registrations in subscriptions.values_mut() {
            if let Some(index) = registrations.iter().position(|r| r.token == token) {
                registrations.remove(index);
                return true;
            }
        }
        false
    }

    /// Delivers the event to every handler subscribed to its type, in
    /// registration order. Handler failures are logged and skipped.
    pub fn publish(&self, event: &Event) {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscriptions = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            subscriptions
                .get(&event.event_type)
                .map(|registrations| {
                    registrations
                        .iter()
                        .map(|r| Arc::clone(&r.handler))
                        .collect()
                })
                .unwrap_or_default()
        };

        for handler in handlers {
            if let Err(error) = handler.handle(event) {
                tracing::warn!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    %error,
                    "event handler failed; continuing fan-out"
                );
            }
        }
    }
}
