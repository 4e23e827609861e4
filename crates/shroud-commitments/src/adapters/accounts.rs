//! In-memory one-time account service.

use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::AccountService;
use async_trait::async_trait;
use parking_lot::RwLock;
use shroud_types::Address;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Length of issued account addresses.
pub const ACCOUNT_ADDRESS_LEN: usize = 20;

struct Account {
    password: String,
    unlocked: bool,
}

#[derive(Default)]
pub struct InMemoryAccountService {
    accounts: RwLock<HashMap<Address, Account>>,
    fail: AtomicBool,
}

impl InMemoryAccountService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn is_unlocked(&self, address: &Address) -> bool {
        self.accounts
            .read()
            .get(address)
            .is_some_and(|account| account.unlocked)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn check_available(&self) -> LifecycleResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LifecycleError::AccountService {
                reason: "account service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountService for InMemoryAccountService {
    async fn create_account(&self, password: &str) -> LifecycleResult<Address> {
        self.check_available()?;
        let address = Address::random(ACCOUNT_ADDRESS_LEN);
        self.accounts.write().insert(
            address.clone(),
            Account {
                password: password.to_string(),
                unlocked: false,
            },
        );
        debug!(%address, "One-time account created");
        Ok(address)
    }

    async fn unlock_account(&self, address: &Address, password: &str) -> LifecycleResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(address)
            .ok_or_else(|| LifecycleError::AccountService {
                reason: format!("unknown account {address}"),
            })?;
        if account.password != password {
            return Err(LifecycleError::AccountService {
                reason: format!("wrong password for account {address}"),
            });
        }
        account.unlocked = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_unlock() {
        let service = InMemoryAccountService::new();
        let address = service.create_account("secret-1").await.unwrap();
        assert!(!service.is_unlocked(&address));

        assert!(service.unlock_account(&address, "wrong").await.is_err());
        service.unlock_account(&address, "secret-1").await.unwrap();
        assert!(service.is_unlocked(&address));
    }

    #[tokio::test]
    async fn test_accounts_are_distinct() {
        let service = InMemoryAccountService::new();
        let a = service.create_account("pw").await.unwrap();
        let b = service.create_account("pw").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(service.account_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_is_retryable() {
        let service = InMemoryAccountService::new();
        service.set_fail(true);
        let err = service.create_account("pw").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
