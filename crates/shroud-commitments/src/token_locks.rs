//! Per-token serialization of lifecycle operations.
//!
//! At most one lifecycle operation holds a token at a time. Operations on
//! different tokens never wait on each other.

use parking_lot::Mutex;
use shroud_types::TokenId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard held for the duration of one lifecycle operation.
pub type TokenGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct TokenLocks {
    // Entries are never removed; one per token ever touched.
    locks: Mutex<HashMap<TokenId, Arc<AsyncMutex<()>>>>,
}

impl TokenLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `token_id` is free and take it.
    pub async fn acquire(&self, token_id: &TokenId) -> TokenGuard {
        let lock = Arc::clone(self.locks.lock().entry(token_id.clone()).or_default());
        lock.lock_owned().await
    }

    /// True while some operation holds `token_id`.
    pub fn is_held(&self, token_id: &TokenId) -> bool {
        self.locks
            .lock()
            .get(token_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}
