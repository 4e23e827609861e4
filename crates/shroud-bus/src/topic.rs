//! # Topics and Routing Keys
//!
//! A topic is exactly four bytes. A routing key is the topic followed by the
//! recipient's channel public key; subscribers only ever see messages whose
//! routing key matches the one they registered.

use crate::error::BusError;
use serde::{Deserialize, Serialize};
use shroud_types::ChannelPublicKey;
use std::fmt;
use std::str::FromStr;

/// Required topic length in bytes.
pub const TOPIC_LEN: usize = 4;

/// Topic used for token transfer notices.
pub const TRANSFER_TOPIC: Topic = Topic([0xec, 0xa7, 0x94, 0x5f]);

/// Four-byte message topic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic([u8; TOPIC_LEN]);

impl Topic {
    pub const fn new(bytes: [u8; TOPIC_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TOPIC_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Topic {
    type Error = BusError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; TOPIC_LEN] = bytes
            .try_into()
            .map_err(|_| BusError::InvalidTopic { len: bytes.len() })?;
        Ok(Self(array))
    }
}

impl FromStr for Topic {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).map_err(|e| BusError::MalformedTopic {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self)
    }
}

/// `topic ++ recipient public key`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey(Vec<u8>);

impl RoutingKey {
    pub fn new(topic: &Topic, recipient: &ChannelPublicKey) -> Self {
        let mut bytes = Vec::with_capacity(TOPIC_LEN + recipient.len());
        bytes.extend_from_slice(topic.as_bytes());
        bytes.extend_from_slice(recipient.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Topic plus the first few key bytes are enough to tell keys apart in logs.
        let shown = self.0.len().min(TOPIC_LEN + 6);
        write!(f, "0x{}..", hex::encode(&self.0[..shown]))
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutingKey(0x{})", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_requires_four_bytes() {
        assert!(Topic::try_from(&[1u8, 2, 3, 4][..]).is_ok());
        assert_eq!(
            Topic::try_from(&[1u8, 2, 3][..]),
            Err(BusError::InvalidTopic { len: 3 })
        );
        assert_eq!(
            Topic::try_from(&[0u8; 5][..]),
            Err(BusError::InvalidTopic { len: 5 })
        );
    }

    #[test]
    fn test_topic_parse_hex() {
        let topic: Topic = "0xeca7945f".parse().unwrap();
        assert_eq!(topic, TRANSFER_TOPIC);
        assert_eq!(topic.to_string(), "0xeca7945f");
        assert!(matches!(
            "0xeca794".parse::<Topic>(),
            Err(BusError::InvalidTopic { len: 3 })
        ));
        assert!(matches!(
            "0xnothex".parse::<Topic>(),
            Err(BusError::MalformedTopic { .. })
        ));
    }

    #[test]
    fn test_routing_key_is_topic_then_key() {
        let key = ChannelPublicKey::new(vec![9, 9]);
        let routing = RoutingKey::new(&TRANSFER_TOPIC, &key);
        assert_eq!(routing.as_bytes(), &[0xec, 0xa7, 0x94, 0x5f, 9, 9]);
    }

    #[test]
    fn test_routing_keys_differ_by_recipient() {
        let a = RoutingKey::new(&TRANSFER_TOPIC, &ChannelPublicKey::new(vec![1]));
        let b = RoutingKey::new(&TRANSFER_TOPIC, &ChannelPublicKey::new(vec![2]));
        assert_ne!(a, b);
    }
}
