//! # Outbound Ports (Driven)
//!
//! External collaborators of the lifecycle: proof engine, ledger, one-time
//! account service and name directory. The notification transport port lives
//! in `shroud-bus`.

use crate::domain::{CommitmentFields, PublicAsset, PublicAssetStatus, TokenCommitment};
use crate::error::LifecycleResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shroud_types::{
    Address, ChannelPublicKey, Commitment, Salt, TokenId, ZkpPublicKey, ZkpSecret,
};

/// Request to shield an asset for an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintCommitment {
    pub token_id: TokenId,
    pub owner_public_key: ZkpPublicKey,
}

pub type MintedCommitment = CommitmentFields;

/// Request to nullify the current commitment and create one for a receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendRequest {
    pub token_id: TokenId,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    pub owner_secret: ZkpSecret,
    pub receiver_name: String,
    pub receiver_public_key: ZkpPublicKey,
}

pub type SpentCommitment = CommitmentFields;

/// Request to nullify the current commitment and release the asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnRequest {
    pub token_id: TokenId,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    pub owner_secret: ZkpSecret,
    pub pay_to: Address,
}

/// Opening of a commitment to check against the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessQuery {
    pub token_id: TokenId,
    pub owner_public_key: ZkpPublicKey,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessReport {
    /// Commitment recomputes from (token id, owner key, salt).
    pub recomputes: bool,
    /// Commitment is stored on-chain at the given index.
    pub on_chain: bool,
}

impl CorrectnessReport {
    pub fn is_valid(&self) -> bool {
        self.recomputes && self.on_chain
    }
}

/// Zero-knowledge commitment engine.
#[async_trait]
pub trait ProofEngine: Send + Sync {
    /// Create a commitment binding `token_id` to the owner's key and a fresh salt.
    async fn mint(&self, owner: &Address, request: MintCommitment)
        -> LifecycleResult<MintedCommitment>;

    /// Nullify the current commitment and create the receiver's.
    async fn spend(&self, on_behalf_of: &Address, request: SpendRequest)
        -> LifecycleResult<SpentCommitment>;

    /// Nullify the current commitment and release the public asset to `pay_to`.
    async fn burn(&self, owner: &Address, request: BurnRequest) -> LifecycleResult<()>;

    async fn check_correctness(&self, query: CorrectnessQuery)
        -> LifecycleResult<CorrectnessReport>;

    /// Commitment stored at `index`, if any.
    async fn commitment_at(&self, index: u64) -> LifecycleResult<Option<Commitment>>;
}

/// Per-owner token and public asset storage.
///
/// Each call is atomic on its own; nothing spans calls.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn add_token(&self, record: TokenCommitment) -> LifecycleResult<()>;

    /// Replace the owner's record holding the same commitment.
    async fn update_token(&self, record: TokenCommitment) -> LifecycleResult<()>;

    /// Most recent record for `token_id` held by `owner`.
    async fn get_token_by_id(
        &self,
        owner: &str,
        token_id: &TokenId,
    ) -> LifecycleResult<Option<TokenCommitment>>;

    /// Every record held by `owner`, burned ones included, oldest first.
    async fn tokens(&self, owner: &str) -> LifecycleResult<Vec<TokenCommitment>>;

    async fn add_public_asset(&self, asset: PublicAsset) -> LifecycleResult<()>;

    async fn update_public_asset(
        &self,
        owner: &str,
        token_id: &TokenId,
        status: PublicAssetStatus,
    ) -> LifecycleResult<()>;

    async fn get_public_asset(
        &self,
        owner: &str,
        token_id: &TokenId,
    ) -> LifecycleResult<Option<PublicAsset>>;
}

/// Issues and unlocks one-time accounts.
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn create_account(&self, password: &str) -> LifecycleResult<Address>;

    async fn unlock_account(&self, address: &Address, password: &str) -> LifecycleResult<()>;
}

/// Name to key and address resolution.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn resolve_public_key_by_name(&self, name: &str) -> LifecycleResult<ZkpPublicKey>;

    async fn resolve_address_by_name(&self, name: &str) -> LifecycleResult<Address>;

    async fn resolve_channel_key_by_name(&self, name: &str) -> LifecycleResult<ChannelPublicKey>;

    /// Publish `name`'s notification channel key.
    async fn set_channel_key(&self, name: &str, key: ChannelPublicKey) -> LifecycleResult<()>;
}
