//! # Domain Entities

use serde::{Deserialize, Serialize};
use shroud_types::{Address, Commitment, Salt, TokenId, ZkpSecret};
use std::fmt;

/// Commitment lifecycle state.
///
/// ```text
/// Minted ──→ Transferred ──→ Burned
///   │            ↺             ↑
///   └──────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStatus {
    /// Created by a mint.
    Minted,
    /// Moved by a transfer. Set on the sender's record, and on the
    /// receiver's record created from the transfer notice.
    Transferred,
    /// Nullified and released. Terminal.
    Burned,
}

impl TokenStatus {
    /// Check if the state machine allows `self -> next`.
    pub fn can_transition_to(&self, next: TokenStatus) -> bool {
        match (self, next) {
            (Self::Minted, Self::Transferred) => true,
            (Self::Transferred, Self::Transferred) => true,
            (Self::Minted, Self::Burned) => true,
            (Self::Transferred, Self::Burned) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Burned)
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minted => "Minted",
            Self::Transferred => "Transferred",
            Self::Burned => "Burned",
        };
        f.write_str(name)
    }
}

/// Commitment created for the receiver by a transfer, recorded on the
/// sender's side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredCommitment {
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
}

/// One owner's view of a token commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCommitment {
    /// Party name owning this record.
    pub owner: String,
    pub token_id: TokenId,
    pub uri: String,
    pub salt: Salt,
    pub commitment: Commitment,
    /// Position in the global commitment set. Never changes once assigned.
    pub commitment_index: u64,
    /// Secret required to spend or burn this commitment.
    pub owner_secret: ZkpSecret,
    pub status: TokenStatus,
    /// Counterparty of the most recent transfer or burn payee.
    pub receiver: Option<String>,
    /// Successor commitment, once this one has been transferred away.
    pub transferred: Option<TransferredCommitment>,
}

/// Fields returned by the proof engine for a new commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentFields {
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
}

impl TokenCommitment {
    /// Record for a freshly minted commitment.
    pub fn minted(
        owner: impl Into<String>,
        token_id: TokenId,
        uri: impl Into<String>,
        fields: CommitmentFields,
        owner_secret: ZkpSecret,
    ) -> Self {
        Self {
            owner: owner.into(),
            token_id,
            uri: uri.into(),
            salt: fields.salt,
            commitment: fields.commitment,
            commitment_index: fields.commitment_index,
            owner_secret,
            status: TokenStatus::Minted,
            receiver: None,
            transferred: None,
        }
    }

    /// Receiver-side record for a commitment created by someone else's
    /// transfer. Spendable: status `Transferred`, no successor.
    pub fn received(
        owner: impl Into<String>,
        token_id: TokenId,
        uri: impl Into<String>,
        fields: CommitmentFields,
        owner_secret: ZkpSecret,
    ) -> Self {
        Self {
            status: TokenStatus::Transferred,
            ..Self::minted(owner, token_id, uri, fields, owner_secret)
        }
    }

    /// True while the owner can still transfer or burn this commitment.
    pub fn is_spendable(&self) -> bool {
        !self.status.is_terminal() && self.transferred.is_none()
    }

    /// Move to `next`, enforcing the state machine.
    pub fn transition(&mut self, next: TokenStatus) -> Result<(), crate::LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(crate::LifecycleError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Sender-side record after a transfer to `receiver`.
    pub fn transfer_to(
        &self,
        receiver: impl Into<String>,
        successor: CommitmentFields,
    ) -> Result<Self, crate::LifecycleError> {
        let mut next = self.clone();
        next.transition(TokenStatus::Transferred)?;
        next.receiver = Some(receiver.into());
        next.transferred = Some(TransferredCommitment {
            salt: successor.salt,
            commitment: successor.commitment,
            commitment_index: successor.commitment_index,
        });
        Ok(next)
    }

    /// Record after a burn paying out to `payee`.
    pub fn burn_to(&self, payee: impl Into<String>) -> Result<Self, crate::LifecycleError> {
        let mut next = self.clone();
        next.transition(TokenStatus::Burned)?;
        next.receiver = Some(payee.into());
        Ok(next)
    }
}

/// Status of the public (non-confidential) asset behind a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicAssetStatus {
    /// Held in the escrow contract while represented by a commitment.
    Shielded,
    /// Released to this owner by a burn.
    Received,
}

/// Ledger entry for the public asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAsset {
    pub owner: String,
    pub token_id: TokenId,
    pub uri: String,
    pub status: PublicAssetStatus,
    /// Escrow contract holding the asset, when known.
    pub shield_contract: Option<Address>,
    /// Party that released the asset to `owner`.
    pub sender: Option<String>,
}
