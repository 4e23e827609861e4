//! # Peer Notices
//!
//! Payloads published on the transfer topic. Serialized as JSON objects with
//! a `for` discriminator so a listener can tell a commitment hand-over from a
//! released public asset.

use serde::{Deserialize, Serialize};
use shroud_types::{Address, Commitment, Salt, TokenId, ZkpPublicKey};

/// Notice delivered to a party on the transfer topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "for")]
pub enum Notice {
    /// A commitment was transferred to the recipient.
    #[serde(rename = "token")]
    Token(TokenTransferNotice),
    /// A burn released the public asset to the recipient.
    #[serde(rename = "NFTToken")]
    PublicAsset(PublicAssetNotice),
}

/// Everything a receiver needs to rebuild and later spend a transferred
/// commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferNotice {
    pub token_uri: String,
    pub token_id: TokenId,
    pub salt: Salt,
    pub commitment: Commitment,
    pub commitment_index: u64,
    pub receiver: String,
    pub receiver_public_key: ZkpPublicKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAssetNotice {
    pub uri: String,
    pub token_id: TokenId,
    pub shield_contract_address: Option<Address>,
    pub receiver: String,
    pub sender: String,
    pub sender_address: Address,
}

impl Notice {
    /// Party the notice is addressed to.
    pub fn receiver(&self) -> &str {
        match self {
            Self::Token(notice) => &notice.receiver,
            Self::PublicAsset(notice) => &notice.receiver,
        }
    }

    pub fn token_id(&self) -> &TokenId {
        match self {
            Self::Token(notice) => &notice.token_id,
            Self::PublicAsset(notice) => &notice.token_id,
        }
    }
}
