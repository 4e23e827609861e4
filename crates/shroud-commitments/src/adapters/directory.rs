//! In-memory name directory.

use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::Directory;
use async_trait::async_trait;
use parking_lot::RwLock;
use shroud_types::{Address, ChannelPublicKey, PartyIdentity, ZkpPublicKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Clone, Debug)]
struct DirectoryEntry {
    public_key: ZkpPublicKey,
    address: Address,
    channel_key: Option<ChannelPublicKey>,
}

/// Name -> (commitment public key, address, channel public key).
#[derive(Default)]
pub struct InMemoryDirectory {
    entries: RwLock<HashMap<String, DirectoryEntry>>,
    fail: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a name.
    pub fn register(&self, name: impl Into<String>, public_key: ZkpPublicKey, address: Address) {
        let name = name.into();
        debug!(%name, "Directory entry registered");
        self.entries.write().insert(
            name,
            DirectoryEntry {
                public_key,
                address,
                channel_key: None,
            },
        );
    }

    /// Register a party under its name. Parties without an address are skipped.
    pub fn register_party(&self, party: &PartyIdentity) -> bool {
        match &party.address {
            Some(address) => {
                self.register(party.name.clone(), party.public_key().clone(), address.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn lookup<T>(
        &self,
        name: &str,
        select: impl FnOnce(&DirectoryEntry) -> Option<T>,
        what: &str,
    ) -> LifecycleResult<T> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(unresolved(name, "directory unavailable"));
        }
        let entries = self.entries.read();
        let entry = entries
            .get(name)
            .ok_or_else(|| unresolved(name, "name not registered"))?;
        select(entry).ok_or_else(|| unresolved(name, &format!("no {what} published")))
    }
}

fn unresolved(name: &str, reason: &str) -> LifecycleError {
    LifecycleError::Directory {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn resolve_public_key_by_name(&self, name: &str) -> LifecycleResult<ZkpPublicKey> {
        self.lookup(name, |entry| Some(entry.public_key.clone()), "public key")
    }

    async fn resolve_address_by_name(&self, name: &str) -> LifecycleResult<Address> {
        self.lookup(name, |entry| Some(entry.address.clone()), "address")
    }

    async fn resolve_channel_key_by_name(&self, name: &str) -> LifecycleResult<ChannelPublicKey> {
        self.lookup(name, |entry| entry.channel_key.clone(), "channel key")
    }

    async fn set_channel_key(&self, name: &str, key: ChannelPublicKey) -> LifecycleResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(unresolved(name, "directory unavailable"));
        }
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| unresolved(name, "name not registered"))?;
        entry.channel_key = Some(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_registered_party() {
        let directory = InMemoryDirectory::new();
        let bob = PartyIdentity::new("bob", Address::random(20));
        assert!(directory.register_party(&bob));

        assert_eq!(
            directory.resolve_public_key_by_name("bob").await.unwrap(),
            *bob.public_key()
        );
        assert_eq!(
            Some(directory.resolve_address_by_name("bob").await.unwrap()),
            bob.address
        );
    }

    #[tokio::test]
    async fn test_unknown_name_is_directory_error() {
        let directory = InMemoryDirectory::new();
        let err = directory.resolve_address_by_name("nobody").await.unwrap_err();
        assert!(matches!(err, LifecycleError::Directory { ref name, .. } if name == "nobody"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_channel_key_published_later() {
        let directory = InMemoryDirectory::new();
        directory.register("bob", ZkpPublicKey::new(vec![1]), Address::random(20));
        assert!(directory.resolve_channel_key_by_name("bob").await.is_err());

        let key = ChannelPublicKey::random(65);
        directory.set_channel_key("bob", key.clone()).await.unwrap();
        assert_eq!(directory.resolve_channel_key_by_name("bob").await.unwrap(), key);
        assert!(directory
            .set_channel_key("carol", ChannelPublicKey::random(65))
            .await
            .is_err());
    }
}
