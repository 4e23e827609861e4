//! In-memory ledger.

use crate::domain::{PublicAsset, PublicAssetStatus, TokenCommitment};
use crate::error::{LifecycleError, LifecycleResult};
use crate::ports::outbound::Ledger;
use async_trait::async_trait;
use parking_lot::RwLock;
use shroud_types::TokenId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    /// Owner -> records, oldest first.
    tokens: HashMap<String, Vec<TokenCommitment>>,
    public_assets: HashMap<(String, TokenId), PublicAsset>,
}

/// Process-local ledger with write failure injection.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    fail_writes: AtomicBool,
    fail_asset_writes: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a transient error.
    pub fn set_fail(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> LifecycleResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LifecycleError::Persistence {
                reason: "ledger unavailable".to_string(),
                transient: true,
            });
        }
        Ok(())
    }

    /// Make public asset writes fail while token writes still succeed.
    pub fn set_fail_asset_writes(&self, fail: bool) {
        self.fail_asset_writes.store(fail, Ordering::SeqCst);
    }

    fn check_asset_writable(&self) -> LifecycleResult<()> {
        self.check_writable()?;
        if self.fail_asset_writes.load(Ordering::SeqCst) {
            return Err(LifecycleError::Persistence {
                reason: "public asset table unavailable".to_string(),
                transient: true,
            });
        }
        Ok(())
    }
}

fn not_found(what: &str, owner: &str, token_id: &TokenId) -> LifecycleError {
    LifecycleError::Persistence {
        reason: format!("no {what} for token {token_id} held by {owner}"),
        transient: false,
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn add_token(&self, record: TokenCommitment) -> LifecycleResult<()> {
        self.check_writable()?;
        debug!(owner = %record.owner, token_id = %record.token_id, "Token record added");
        self.state
            .write()
            .tokens
            .entry(record.owner.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn update_token(&self, record: TokenCommitment) -> LifecycleResult<()> {
        self.check_writable()?;
        let mut state = self.state.write();
        let existing = state
            .tokens
            .get_mut(&record.owner)
            .and_then(|records| {
                records.iter_mut().rev().find(|r| {
                    r.token_id == record.token_id && r.commitment == record.commitment
                })
            })
            .ok_or_else(|| not_found("token record", &record.owner, &record.token_id))?;

        debug!(
            owner = %record.owner,
            token_id = %record.token_id,
            status = %record.status,
            "Token record updated"
        );
        *existing = record;
        Ok(())
    }

    async fn get_token_by_id(
        &self,
        owner: &str,
        token_id: &TokenId,
    ) -> LifecycleResult<Option<TokenCommitment>> {
        Ok(self.state.read().tokens.get(owner).and_then(|records| {
            records
                .iter()
                .rev()
                .find(|r| r.token_id == *token_id)
                .cloned()
        }))
    }

    async fn tokens(&self, owner: &str) -> LifecycleResult<Vec<TokenCommitment>> {
        Ok(self
            .state
            .read()
            .tokens
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_public_asset(&self, asset: PublicAsset) -> LifecycleResult<()> {
        self.check_asset_writable()?;
        debug!(owner = %asset.owner, token_id = %asset.token_id, status = ?asset.status, "Public asset recorded");
        self.state
            .write()
            .public_assets
            .insert((asset.owner.clone(), asset.token_id.clone()), asset);
        Ok(())
    }

    async fn update_public_asset(
        &self,
        owner: &str,
        token_id: &TokenId,
        status: PublicAssetStatus,
    ) -> LifecycleResult<()> {
        self.check_asset_writable()?;
        let mut state = self.state.write();
        let asset = state
            .public_assets
            .get_mut(&(owner.to_string(), token_id.clone()))
            .ok_or_else(|| not_found("public asset", owner, token_id))?;
        asset.status = status;
        Ok(())
    }

    async fn get_public_asset(
        &self,
        owner: &str,
        token_id: &TokenId,
    ) -> LifecycleResult<Option<PublicAsset>> {
        Ok(self
            .state
            .read()
            .public_assets
            .get(&(owner.to_string(), token_id.clone()))
            .cloned())
    }
}
