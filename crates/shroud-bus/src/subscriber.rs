//! # Subscriptions
//!
//! Each subscription owns its own unbounded queue, so a slow consumer only
//! ever delays itself. Subscriptions stay registered until explicitly removed
//! with [`NotificationChannel::unsubscribe`](crate::NotificationChannel::unsubscribe)
//! or until their receiving side is dropped.

use crate::envelope::NotificationEnvelope;
use crate::topic::RoutingKey;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier of a registered subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Future returned by a notification handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked for every envelope delivered to a subscription.
pub type NotificationHandler = Arc<dyn Fn(NotificationEnvelope) -> HandlerFuture + Send + Sync>;

/// Handle returned for callback-driven subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub routing_key: RoutingKey,
}

/// Queue-driven subscription.
pub struct Subscription {
    id: SubscriptionId,
    routing_key: RoutingKey,
    receiver: mpsc::UnboundedReceiver<NotificationEnvelope>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        routing_key: RoutingKey,
        receiver: mpsc::UnboundedReceiver<NotificationEnvelope>,
    ) -> Self {
        Self {
            id,
            routing_key,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn routing_key(&self) -> &RoutingKey {
        &self.routing_key
    }

    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle {
            id: self.id,
            routing_key: self.routing_key.clone(),
        }
    }

    /// Receive the next envelope.
    ///
    /// Returns `None` once the subscription has been removed from the channel
    /// (or the channel dropped) and the queue is drained.
    pub async fn recv(&mut self) -> Option<NotificationEnvelope> {
        self.receiver.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<NotificationEnvelope> {
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("routing_key", &self.routing_key)
            .finish()
    }
}
