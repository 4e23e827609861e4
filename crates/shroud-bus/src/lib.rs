//! # Shroud Bus - Peer Notification Channel
//!
//! Asynchronous, topic-addressed publish/subscribe between parties, plus the
//! identity registry that binds channel handles to party addresses.
//!
//! ## Routing
//!
//! A message is addressed to `topic ++ recipient public key`. A subscriber
//! listening on `topic ++ publicKeyOf(identity)` receives exactly the
//! messages published to that key after it subscribed.
//!
//! ```text
//! ┌──────────┐  publish(payload, alice, pk_bob, topic)
//! │  Alice   │ ──────────────┐
//! └──────────┘               ▼
//!                    ┌────────────────┐   +delivery delay   ┌──────────┐
//!                    │  Notification  │ ──────────────────→ │   Bob    │
//!                    │    Channel     │                     │ (topic ++│
//!                    └────────────────┘                     │  pk_bob) │
//!                                                           └──────────┘
//! ```
//!
//! ## Delivery
//!
//! - Publishing never waits for delivery; the delay defaults to 3 seconds
//! - Every subscriber on the routing key receives each message once, in
//!   publish order
//! - Messages with no subscriber at dispatch time are dropped and counted
//! - A failing handler never affects other subscribers or the publisher

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel;
pub mod config;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod subscriber;
pub mod topic;
pub mod transport;

pub use channel::{ChannelStats, NotificationChannel};
pub use config::{ChannelConfig, DEFAULT_DELIVERY_DELAY, DEFAULT_TTL_SECS};
pub use envelope::{encode, MessageId, NotificationEnvelope};
pub use error::BusError;
pub use registry::{IdentityRecord, IdentityRegistry, CHANNEL_KEY_LEN, IDENTITY_HANDLE_LEN};
pub use subscriber::{
    HandlerFuture, NotificationHandler, Subscription, SubscriptionHandle, SubscriptionId,
};
pub use topic::{RoutingKey, Topic, TOPIC_LEN, TRANSFER_TOPIC};
pub use transport::NotificationTransport;
