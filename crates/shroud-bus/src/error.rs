//! # Bus Errors

use thiserror::Error;

/// Errors from identity and channel operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Topic was not exactly four bytes.
    #[error("Topic must be 4 bytes long, got {len}")]
    InvalidTopic { len: usize },

    /// Hex topic string could not be parsed.
    #[error("Invalid topic {value:?}: {reason}")]
    MalformedTopic { value: String, reason: String },

    /// Identity generation requested for a party without an address.
    #[error("No valid address has been set for party {party}")]
    InvalidIdentity { party: String },

    /// Identity handle was never generated on this registry.
    #[error("Unknown channel identity: {handle}")]
    UnknownIdentity { handle: String },

    /// Recipient public key was empty.
    #[error("Recipient public key is empty")]
    InvalidRecipient,

    /// Payload could not be encoded or decoded.
    #[error("Payload codec error: {0}")]
    Codec(String),

    /// Delivery delay and TTL do not form a usable window.
    #[error("Invalid channel configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The channel has been shut down.
    #[error("Notification channel closed")]
    Closed,
}

impl BusError {
    /// True for errors caused by malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTopic { .. }
                | Self::MalformedTopic { .. }
                | Self::InvalidIdentity { .. }
                | Self::UnknownIdentity { .. }
                | Self::InvalidRecipient
                | Self::InvalidConfig { .. }
        )
    }
}
