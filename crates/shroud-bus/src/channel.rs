//! # Notification Channel
//!
//! In-memory implementation of the peer notification bus.
//!
//! ```text
//! publish() ──validate──→ schedule queue ──(delivery delay)──→ dispatcher
//!                                                                  │
//!                               routing table [topic ++ recipient key]
//!                                                                  │
//!                              ┌───────────────┬───────────────────┘
//!                              ↓               ↓
//!                        subscriber queue  subscriber queue  ...
//!                              ↓               ↓
//!                         handler task     recv() caller
//! ```
//!
//! A single dispatcher task drains the schedule queue in publish order and
//! sleeps until each message's deadline, so per-routing-key ordering is the
//! publish order. Fan-out pushes onto per-subscriber queues without awaiting
//! any consumer. Failures after the delay (no subscriber, subscriber gone,
//! message expired) are logged and counted, never reported to the publisher.

use crate::config::ChannelConfig;
use crate::envelope::{encode, MessageId, NotificationEnvelope};
use crate::error::BusError;
use crate::registry::IdentityRegistry;
use crate::subscriber::{
    HandlerFuture, NotificationHandler, Subscription, SubscriptionHandle, SubscriptionId,
};
use crate::topic::{RoutingKey, Topic};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shroud_telemetry::{NOTIFICATIONS_DELIVERED, NOTIFICATIONS_PUBLISHED, NOTIFICATIONS_UNDELIVERED};
use shroud_types::{ChannelPublicKey, IdentityHandle, PartyIdentity};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

struct Route {
    id: SubscriptionId,
    sender: mpsc::UnboundedSender<NotificationEnvelope>,
}

type RouteTable = Arc<Mutex<HashMap<RoutingKey, Vec<Route>>>>;

struct ScheduledDelivery {
    deliver_at: Instant,
    /// End of the TTL window, on the same clock as `deliver_at`.
    expires_at: Instant,
    envelope: NotificationEnvelope,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    undelivered: AtomicU64,
}

/// Snapshot of channel activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Messages accepted by `publish`.
    pub published: u64,
    /// Envelopes handed to subscriber queues (one per subscriber).
    pub delivered: u64,
    /// Messages dispatched with no live subscriber, or expired.
    pub undelivered: u64,
}

/// Process-wide publish/subscribe bus addressed by `(topic, recipient key)`.
pub struct NotificationChannel {
    registry: Arc<IdentityRegistry>,
    config: ChannelConfig,
    routes: RouteTable,
    counters: Arc<Counters>,
    schedule: mpsc::UnboundedSender<ScheduledDelivery>,
    /// Receiving end of `schedule`, taken when the dispatcher starts.
    pending: Mutex<Option<mpsc::UnboundedReceiver<ScheduledDelivery>>>,
    shutdown: watch::Sender<bool>,
    next_subscription: AtomicU64,
}

impl NotificationChannel {
    /// Create a channel over a shared identity registry.
    ///
    /// The dispatcher task is spawned on the first publish, so construction
    /// does not require a running Tokio runtime.
    pub fn new(registry: Arc<IdentityRegistry>, config: ChannelConfig) -> Self {
        let (schedule, pending) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            config,
            routes: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            schedule,
            pending: Mutex::new(Some(pending)),
            shutdown,
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Generate a channel identity for `party`. See [`IdentityRegistry::generate_identity`].
    pub fn generate_identity(
        &self,
        party: &PartyIdentity,
    ) -> Result<(IdentityHandle, ChannelPublicKey), BusError> {
        self.registry.generate_identity(party)
    }

    /// Public key for a previously generated identity.
    pub fn public_key_of(&self, identity: &IdentityHandle) -> Result<ChannelPublicKey, BusError> {
        self.registry.public_key(identity)
    }

    // =========================================================================
    // SUBSCRIBE
    // =========================================================================

    /// Register a queue-driven subscription for `topic ++ publicKeyOf(identity)`.
    pub fn subscribe(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
    ) -> Result<Subscription, BusError> {
        let topic = Topic::try_from(topic)?;
        let public_key = self.registry.public_key(identity)?;
        let routing_key = RoutingKey::new(&topic, &public_key);

        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));

        self.routes
            .lock()
            .entry(routing_key.clone())
            .or_default()
            .push(Route { id, sender });

        debug!(subscription = %id, %routing_key, "Subscription registered");
        Ok(Subscription::new(id, routing_key, receiver))
    }

    /// Register a boxed handler. Must be called within a Tokio runtime.
    ///
    /// Envelopes are handed to the handler one at a time, in delivery order.
    /// Each invocation runs in its own task; a panic is logged and the next
    /// envelope is still delivered.
    pub fn subscribe_handler(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: NotificationHandler,
    ) -> Result<SubscriptionHandle, BusError> {
        let mut subscription = self.subscribe(identity, topic)?;
        let handle = subscription.handle();

        tokio::spawn(async move {
            let id = subscription.id();
            while let Some(envelope) = subscription.recv().await {
                let message_id = envelope.id;
                if let Err(e) = tokio::spawn(handler(envelope)).await {
                    warn!(subscription = %id, %message_id, error = %e, "Notification handler failed");
                }
            }
            debug!(subscription = %id, "Subscription worker stopped");
        });

        Ok(handle)
    }

    /// Register an async closure as handler. Must be called within a Tokio runtime.
    pub fn subscribe_with<F, Fut>(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: F,
    ) -> Result<SubscriptionHandle, BusError>
    where
        F: Fn(NotificationEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: NotificationHandler =
            Arc::new(move |envelope| -> HandlerFuture { Box::pin(handler(envelope)) });
        self.subscribe_handler(identity, topic, handler)
    }

    /// Register a handler for JSON-encoded objects of type `T`.
    ///
    /// Payloads that do not decode as `T` are logged and skipped.
    pub fn subscribe_object<T, F, Fut>(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: F,
    ) -> Result<SubscriptionHandle, BusError>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.subscribe_with(identity, topic, move |envelope: NotificationEnvelope| {
            let handler = Arc::clone(&handler);
            async move {
                match envelope.decode::<T>() {
                    Ok(object) => handler(object).await,
                    Err(e) => {
                        warn!(message_id = %envelope.id, error = %e, "Dropping undecodable notification")
                    }
                }
            }
        })
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut routes = self.routes.lock();
        let mut removed = false;
        routes.retain(|_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|route| route.id != id);
            removed |= subscribers.len() != before;
            !subscribers.is_empty()
        });
        if removed {
            debug!(subscription = %id, "Subscription removed");
        }
        removed
    }

    /// Number of live subscriptions for a routing key.
    pub fn subscriber_count(&self, routing_key: &RoutingKey) -> usize {
        self.routes
            .lock()
            .get(routing_key)
            .map_or(0, |subscribers| subscribers.len())
    }

    // =========================================================================
    // PUBLISH
    // =========================================================================

    /// Schedule `payload` for delivery to `topic ++ recipient`.
    ///
    /// Returns as soon as the message is queued. Dispatch happens after the
    /// configured delivery delay. Fails synchronously only on malformed input
    /// or a shut down channel.
    pub async fn publish(
        &self,
        payload: Vec<u8>,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        topic: &[u8],
    ) -> Result<MessageId, BusError> {
        let topic = Topic::try_from(topic)?;
        let sender_key = self.registry.public_key(sender)?;
        if recipient.is_empty() {
            return Err(BusError::InvalidRecipient);
        }
        if *self.shutdown.borrow() {
            return Err(BusError::Closed);
        }

        self.ensure_dispatcher();

        let envelope = NotificationEnvelope::new(
            sender_key,
            recipient.clone(),
            topic,
            self.config.ttl_secs(),
            payload,
        );
        let message_id = envelope.id;
        let routing_key = envelope.routing_key();
        let now = Instant::now();

        self.schedule
            .send(ScheduledDelivery {
                deliver_at: now + self.config.delivery_delay(),
                expires_at: now + self.config.ttl(),
                envelope,
            })
            .map_err(|_| BusError::Closed)?;

        self.counters.published.fetch_add(1, Ordering::Relaxed);
        NOTIFICATIONS_PUBLISHED.inc();
        debug!(
            %message_id,
            %routing_key,
            delay_ms = self.config.delivery_delay().as_millis() as u64,
            "Notification scheduled"
        );
        Ok(message_id)
    }

    /// Encode `object` as JSON and publish it.
    pub async fn publish_object<T: Serialize + Sync>(
        &self,
        object: &T,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        topic: &[u8],
    ) -> Result<MessageId, BusError> {
        let payload = encode(object)?;
        self.publish(payload, sender, recipient, topic).await
    }

    /// Drop all pending deliveries and refuse further publishes.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        debug!("Notification channel shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            published: self.counters.published.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            undelivered: self.counters.undelivered.load(Ordering::Relaxed),
        }
    }

    fn ensure_dispatcher(&self) {
        let Some(queue) = self.pending.lock().take() else {
            return;
        };
        tokio::spawn(run_dispatcher(
            queue,
            Arc::clone(&self.routes),
            Arc::clone(&self.counters),
            self.shutdown.subscribe(),
        ));
    }
}

async fn run_dispatcher(
    mut queue: mpsc::UnboundedReceiver<ScheduledDelivery>,
    routes: RouteTable,
    counters: Arc<Counters>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let scheduled = tokio::select! {
            next = queue.recv() => match next {
                Some(scheduled) => scheduled,
                None => break,
            },
            _ = stopped(&mut shutdown) => break,
        };

        tokio::select! {
            _ = tokio::time::sleep_until(scheduled.deliver_at) => {}
            _ = stopped(&mut shutdown) => break,
        }

        dispatch(&routes, &counters, scheduled);
    }
    debug!("Notification dispatcher stopped");
}

/// Resolves once shutdown is requested. Never resolves if the channel was
/// dropped without a shutdown; the queue closing ends the dispatcher instead.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

fn dispatch(routes: &RouteTable, counters: &Counters, scheduled: ScheduledDelivery) {
    let envelope = scheduled.envelope;
    let message_id = envelope.id;
    let routing_key = envelope.routing_key();

    if Instant::now() > scheduled.expires_at {
        counters.undelivered.fetch_add(1, Ordering::Relaxed);
        NOTIFICATIONS_UNDELIVERED.inc();
        warn!(%message_id, %routing_key, "Notification expired before dispatch");
        return;
    }

    let mut routes = routes.lock();
    let Some(subscribers) = routes.get_mut(&routing_key) else {
        counters.undelivered.fetch_add(1, Ordering::Relaxed);
        NOTIFICATIONS_UNDELIVERED.inc();
        debug!(%message_id, %routing_key, "No subscribers, notification dropped");
        return;
    };

    let mut delivered = 0u64;
    subscribers.retain(|route| match route.sender.send(envelope.clone()) {
        Ok(()) => {
            delivered += 1;
            true
        }
        Err(_) => {
            debug!(subscription = %route.id, "Pruning closed subscription");
            false
        }
    });
    if subscribers.is_empty() {
        routes.remove(&routing_key);
    }
    drop(routes);

    if delivered == 0 {
        counters.undelivered.fetch_add(1, Ordering::Relaxed);
        NOTIFICATIONS_UNDELIVERED.inc();
    } else {
        counters.delivered.fetch_add(delivered, Ordering::Relaxed);
        NOTIFICATIONS_DELIVERED.inc_by(delivered as f64);
    }
    debug!(%message_id, %routing_key, delivered, "Notification dispatched");
}
