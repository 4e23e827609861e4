//! # Identity Registry
//!
//! Process-wide store from a channel identity handle to the party's address,
//! optional one-time address, and channel public key. Entries are never
//! evicted; the registry lives as long as the process that built it.
//!
//! Handles and keys are opaque random values. Signing and encryption are the
//! concern of a production transport, not of this registry.

use crate::error::BusError;
use parking_lot::RwLock;
use shroud_types::{Address, ChannelPublicKey, IdentityHandle, PartyIdentity};
use std::collections::HashMap;
use tracing::debug;

/// Length of a generated identity handle.
pub const IDENTITY_HANDLE_LEN: usize = 32;

/// Length of a generated channel public key (uncompressed point size).
pub const CHANNEL_KEY_LEN: usize = 65;

/// What the registry knows about one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityRecord {
    pub party: String,
    pub address: Address,
    pub one_time_address: Option<Address>,
    pub public_key: ChannelPublicKey,
}

/// Handle -> identity record.
#[derive(Default)]
pub struct IdentityRegistry {
    identities: RwLock<HashMap<IdentityHandle, IdentityRecord>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new identity handle and key pair for `party`.
    ///
    /// Fails with [`BusError::InvalidIdentity`] if the party has no address.
    pub fn generate_identity(
        &self,
        party: &PartyIdentity,
    ) -> Result<(IdentityHandle, ChannelPublicKey), BusError> {
        let address = match &party.address {
            Some(address) if !address.is_empty() => address.clone(),
            _ => {
                return Err(BusError::InvalidIdentity {
                    party: party.name.clone(),
                })
            }
        };

        let handle = IdentityHandle::random(IDENTITY_HANDLE_LEN);
        let public_key = ChannelPublicKey::random(CHANNEL_KEY_LEN);

        self.identities.write().insert(
            handle.clone(),
            IdentityRecord {
                party: party.name.clone(),
                address,
                one_time_address: party.one_time_address.clone(),
                public_key: public_key.clone(),
            },
        );

        debug!(party = %party.name, "Channel identity generated");
        Ok((handle, public_key))
    }

    /// Public key for a previously generated handle.
    pub fn public_key(&self, handle: &IdentityHandle) -> Result<ChannelPublicKey, BusError> {
        self.identities
            .read()
            .get(handle)
            .map(|record| record.public_key.clone())
            .ok_or_else(|| unknown(handle))
    }

    /// Full record for a previously generated handle.
    pub fn record(&self, handle: &IdentityHandle) -> Result<IdentityRecord, BusError> {
        self.identities
            .read()
            .get(handle)
            .cloned()
            .ok_or_else(|| unknown(handle))
    }

    /// Attach a freshly issued one-time address to an identity.
    pub fn record_one_time_address(
        &self,
        handle: &IdentityHandle,
        address: Address,
    ) -> Result<(), BusError> {
        let mut identities = self.identities.write();
        let record = identities.get_mut(handle).ok_or_else(|| unknown(handle))?;
        record.one_time_address = Some(address);
        Ok(())
    }

    pub fn contains(&self, handle: &IdentityHandle) -> bool {
        self.identities.read().contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }
}

fn unknown(handle: &IdentityHandle) -> BusError {
    BusError::UnknownIdentity {
        handle: handle.to_hex(),
    }
}
