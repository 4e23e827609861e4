//! # Notification Envelope
//!
//! The unit of delivery on the channel. The sender's channel public key is
//! carried as signature material; the payload is opaque bytes.

use crate::error::BusError;
use crate::topic::{RoutingKey, Topic};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shroud_types::ChannelPublicKey;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Identifier assigned to each published message.
pub type MessageId = Uuid;

/// A message in flight on the notification channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub id: MessageId,
    /// Sender's channel public key.
    pub sender_key: ChannelPublicKey,
    /// Recipient's channel public key.
    pub recipient_key: ChannelPublicKey,
    pub topic: Topic,
    /// Unix milliseconds at publish time.
    pub timestamp_ms: u64,
    /// Validity window from `timestamp_ms`. Envelopes not dispatched
    /// within it are dropped.
    pub ttl_secs: u32,
    pub payload: Vec<u8>,
}

impl NotificationEnvelope {
    pub fn new(
        sender_key: ChannelPublicKey,
        recipient_key: ChannelPublicKey,
        topic: Topic,
        ttl_secs: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_key,
            recipient_key,
            topic,
            timestamp_ms: unix_millis(),
            ttl_secs,
            payload,
        }
    }

    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::new(&self.topic, &self.recipient_key)
    }

    /// Decode a JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        serde_json::from_slice(&self.payload).map_err(|e| BusError::Codec(e.to_string()))
    }
}

/// Encode a value as a JSON payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, BusError> {
    serde_json::to_vec(value).map_err(|e| BusError::Codec(e.to_string()))
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
