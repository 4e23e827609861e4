//! # Parties
//!
//! A party is a named local actor: a stable on-chain address, a commitment
//! key pair, and (once issued) a one-time address and a notification channel
//! identity.

use crate::bytes::{Address, IdentityHandle, ZkpPublicKey, ZkpSecret};
use sha2::{Digest, Sha256};

/// Length of a generated owner secret, in bytes.
pub const ZKP_SECRET_LEN: usize = 27;

/// Length of a derived owner public key, in bytes.
pub const ZKP_PUBLIC_KEY_LEN: usize = 27;

/// Derive the public key for an owner secret.
///
/// SHA-256 of the secret truncated to [`ZKP_PUBLIC_KEY_LEN`] bytes.
pub fn derive_public_key(secret: &ZkpSecret) -> ZkpPublicKey {
    let digest = Sha256::digest(secret.as_bytes());
    ZkpPublicKey::new(digest[..ZKP_PUBLIC_KEY_LEN].to_vec())
}

/// Commitment key pair for an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZkpKeyPair {
    pub public_key: ZkpPublicKey,
    pub secret: ZkpSecret,
}

impl ZkpKeyPair {
    /// Generate a fresh key pair from the thread-local CSPRNG.
    pub fn generate() -> Self {
        Self::from_secret(ZkpSecret::random(ZKP_SECRET_LEN))
    }

    /// Rebuild a key pair from a known secret.
    pub fn from_secret(secret: ZkpSecret) -> Self {
        Self {
            public_key: derive_public_key(&secret),
            secret,
        }
    }
}

/// A local actor able to own, send and receive token commitments.
#[derive(Clone, Debug)]
pub struct PartyIdentity {
    /// Human-readable name, resolvable through the directory.
    pub name: String,
    /// Stable on-chain address. Required for channel identities.
    pub address: Option<Address>,
    /// Commitment key pair.
    pub keys: ZkpKeyPair,
    /// Most recently issued one-time address, if any.
    pub one_time_address: Option<Address>,
    /// Notification channel identity, if one has been generated.
    pub channel_identity: Option<IdentityHandle>,
}

impl PartyIdentity {
    /// Create a party with a freshly generated key pair.
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self::with_keys(name, Some(address), ZkpKeyPair::generate())
    }

    /// Create a party from known key material.
    pub fn with_keys(name: impl Into<String>, address: Option<Address>, keys: ZkpKeyPair) -> Self {
        Self {
            name: name.into(),
            address,
            keys,
            one_time_address: None,
            channel_identity: None,
        }
    }

    pub fn public_key(&self) -> &ZkpPublicKey {
        &self.keys.public_key
    }

    pub fn secret(&self) -> &ZkpSecret {
        &self.keys.secret
    }

    /// True when the party carries a usable on-chain address.
    pub fn has_address(&self) -> bool {
        self.address.as_ref().is_some_and(|a| !a.is_empty())
    }
}
