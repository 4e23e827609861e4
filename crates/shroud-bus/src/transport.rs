//! # Transport Port
//!
//! The seam between the commitment lifecycle and whatever carries peer
//! notifications. [`NotificationChannel`] is the in-process implementation.

use crate::channel::NotificationChannel;
use crate::envelope::MessageId;
use crate::error::BusError;
use crate::subscriber::{NotificationHandler, SubscriptionHandle, SubscriptionId};
use async_trait::async_trait;
use shroud_types::{Address, ChannelPublicKey, IdentityHandle, PartyIdentity};
use std::sync::Arc;

/// Peer notification transport.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Generate a channel identity for a party with an address.
    fn generate_identity(
        &self,
        party: &PartyIdentity,
    ) -> Result<(IdentityHandle, ChannelPublicKey), BusError>;

    /// Public key of a previously generated identity.
    fn public_key_of(&self, identity: &IdentityHandle) -> Result<ChannelPublicKey, BusError>;

    /// Attach a one-time address to an identity.
    fn record_one_time_address(
        &self,
        identity: &IdentityHandle,
        address: Address,
    ) -> Result<(), BusError>;

    /// Schedule `payload` for delivery to `topic ++ recipient`.
    async fn publish(
        &self,
        payload: Vec<u8>,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        topic: &[u8],
    ) -> Result<MessageId, BusError>;

    /// Register a handler for `topic ++ publicKeyOf(identity)`.
    fn subscribe_handler(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: NotificationHandler,
    ) -> Result<SubscriptionHandle, BusError>;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

#[async_trait]
impl NotificationTransport for NotificationChannel {
    fn generate_identity(
        &self,
        party: &PartyIdentity,
    ) -> Result<(IdentityHandle, ChannelPublicKey), BusError> {
        NotificationChannel::generate_identity(self, party)
    }

    fn public_key_of(&self, identity: &IdentityHandle) -> Result<ChannelPublicKey, BusError> {
        NotificationChannel::public_key_of(self, identity)
    }

    fn record_one_time_address(
        &self,
        identity: &IdentityHandle,
        address: Address,
    ) -> Result<(), BusError> {
        self.registry().record_one_time_address(identity, address)
    }

    async fn publish(
        &self,
        payload: Vec<u8>,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        topic: &[u8],
    ) -> Result<MessageId, BusError> {
        NotificationChannel::publish(self, payload, sender, recipient, topic).await
    }

    fn subscribe_handler(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: NotificationHandler,
    ) -> Result<SubscriptionHandle, BusError> {
        NotificationChannel::subscribe_handler(self, identity, topic, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        NotificationChannel::unsubscribe(self, id)
    }
}

#[async_trait]
impl<T: NotificationTransport + ?Sized> NotificationTransport for Arc<T> {
    fn generate_identity(
        &self,
        party: &PartyIdentity,
    ) -> Result<(IdentityHandle, ChannelPublicKey), BusError> {
        (**self).generate_identity(party)
    }

    fn public_key_of(&self, identity: &IdentityHandle) -> Result<ChannelPublicKey, BusError> {
        (**self).public_key_of(identity)
    }

    fn record_one_time_address(
        &self,
        identity: &IdentityHandle,
        address: Address,
    ) -> Result<(), BusError> {
        (**self).record_one_time_address(identity, address)
    }

    async fn publish(
        &self,
        payload: Vec<u8>,
        sender: &IdentityHandle,
        recipient: &ChannelPublicKey,
        topic: &[u8],
    ) -> Result<MessageId, BusError> {
        (**self).publish(payload, sender, recipient, topic).await
    }

    fn subscribe_handler(
        &self,
        identity: &IdentityHandle,
        topic: &[u8],
        handler: NotificationHandler,
    ) -> Result<SubscriptionHandle, BusError> {
        (**self).subscribe_handler(identity, topic, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}
