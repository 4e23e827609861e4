//! # Inbound Ports (Driving)
//!
//! API exposed to callers of the lifecycle.

use crate::domain::TokenCommitment;
use crate::error::LifecycleResult;
use crate::ports::outbound::{CorrectnessQuery, CorrectnessReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shroud_types::{Address, Commitment, PartyIdentity, Salt, TokenId, ZkpPublicKey};

/// Transfer of the sender's current commitment to a named receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferToken {
    pub token_id: TokenId,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    pub receiver: String,
}

impl TransferToken {
    /// Request moving `record` to `receiver`.
    pub fn of(record: &TokenCommitment, receiver: impl Into<String>) -> Self {
        Self {
            token_id: record.token_id.clone(),
            salt: record.salt.clone(),
            commitment: record.commitment.clone(),
            commitment_index: record.commitment_index,
            receiver: receiver.into(),
        }
    }
}

/// Burn of the owner's current commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnToken {
    pub token_id: TokenId,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    /// Payee name. Defaults to the burner.
    pub pay_to: Option<String>,
}

impl BurnToken {
    /// Request burning `record`, paying out to `pay_to` or the owner.
    pub fn of(record: &TokenCommitment, pay_to: Option<String>) -> Self {
        Self {
            token_id: record.token_id.clone(),
            salt: record.salt.clone(),
            commitment: record.commitment.clone(),
            commitment_index: record.commitment_index,
            pay_to,
        }
    }
}

/// Public fields of the receiver's new commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub token_id: TokenId,
    pub uri: String,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    pub receiver: String,
    pub receiver_public_key: ZkpPublicKey,
    /// One-time account the spend was submitted from.
    pub one_time_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub token_id: TokenId,
    pub uri: String,
    pub pay_to: String,
    pub pay_to_address: Address,
    /// True when a third-party payee was sent a notice.
    pub payee_notified: bool,
}

/// Commitment lifecycle API.
#[async_trait]
pub trait CommitmentLifecycleApi: Send + Sync {
    /// Shield `token_id` as a new commitment owned by `owner`.
    async fn mint(
        &self,
        owner: &PartyIdentity,
        token_id: TokenId,
        uri: &str,
    ) -> LifecycleResult<TokenCommitment>;

    /// Transfer the sender's current commitment and notify the receiver.
    async fn transfer(
        &self,
        sender: &PartyIdentity,
        request: TransferToken,
    ) -> LifecycleResult<TransferReceipt>;

    /// Burn the owner's current commitment and release the public asset.
    async fn burn(&self, owner: &PartyIdentity, request: BurnToken) -> LifecycleResult<BurnReceipt>;

    /// Ask the proof engine whether a commitment is well formed and on-chain.
    async fn check_correctness(&self, query: CorrectnessQuery)
        -> LifecycleResult<CorrectnessReport>;
}
